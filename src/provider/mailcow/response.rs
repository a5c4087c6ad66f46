//! # Response Normalizer
//!
//! mailcow reports failures in several shapes, frequently with HTTP 200:
//!
//! - `401` for a rejected API key
//! - `400` with `{"type": "error", "msg": "..."}`
//! - `200` with `[{"type": "danger", "msg": "..."}]`
//! - `200` with `[{"type": "danger", "msg": ["key", "arg", ...]}]`
//!
//! Lookups for a missing record return an empty object (or an empty list)
//! instead of a 404, so existence is decided from the decoded record alone.

use super::error::MailcowError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `{type, msg}` body of a 400 response
#[derive(Debug, Deserialize)]
struct BadRequestBody {
    #[serde(default)]
    msg: String,
    #[serde(default, rename = "type")]
    _type: String,
}

/// Status record with a plain string message
#[derive(Debug, Deserialize)]
struct StatusRecord {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    msg: String,
}

/// Status record whose message is a list of fragments
#[derive(Debug, Deserialize)]
struct StatusRecordMsgArray {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    msg: Vec<serde_json::Value>,
}

const DANGER: &str = "danger";

/// Classify a buffered response
///
/// The body is only borrowed; callers keep the buffer and decode it afterwards.
pub fn check_response(status: StatusCode, body: &[u8]) -> Result<(), MailcowError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(MailcowError::Unauthorized);
    }

    if status == StatusCode::BAD_REQUEST {
        return match serde_json::from_slice::<BadRequestBody>(body) {
            Ok(bad_request) => Err(MailcowError::BadRequest(bad_request.msg)),
            Err(_) => Err(MailcowError::BadRequest(
                String::from_utf8_lossy(body).into_owned(),
            )),
        };
    }

    if let Ok(records) = serde_json::from_slice::<Vec<StatusRecord>>(body) {
        if let Some(danger) = records.iter().find(|r| r.kind == DANGER) {
            return Err(MailcowError::Danger(danger.msg.clone()));
        }
    }

    if let Ok(records) = serde_json::from_slice::<Vec<StatusRecordMsgArray>>(body) {
        if let Some(danger) = records.iter().find(|r| r.kind == DANGER) {
            return Err(MailcowError::Danger(join_fragments(&danger.msg)));
        }
    }

    Ok(())
}

/// Render a message array as `a, b, c`
fn join_fragments(fragments: &[serde_json::Value]) -> String {
    fragments
        .iter()
        .map(|f| match f {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A decoded record that knows whether it names a real backend object
pub trait Identified {
    /// Value of the identity field, if the backend returned one
    fn identity(&self) -> Option<&str>;
}

/// Decode a single-object lookup
///
/// Accepts an object, an empty object, `null`, or a list (first element wins).
/// A record whose identity field is absent or empty is treated as not found.
pub fn decode_single<T>(body: &[u8]) -> Result<Option<T>, MailcowError>
where
    T: DeserializeOwned + Identified,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_slice(body)?;
    let record = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Array(mut items) => {
            if items.is_empty() {
                return Ok(None);
            }
            items.swap_remove(0)
        }
        other => other,
    };

    let record: T = serde_json::from_value(record)?;
    let present = record.identity().is_some_and(|id| !id.is_empty());
    Ok(present.then_some(record))
}

/// Decode a list endpoint, tolerating `null`, `{}` and a bare object
pub fn decode_list<T>(body: &[u8]) -> Result<Vec<T>, MailcowError>
where
    T: DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_slice(body)?;
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(MailcowError::from))
            .collect(),
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(Vec::new()),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}
