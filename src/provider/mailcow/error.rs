//! # mailcow Errors
//!
//! Failure classes of a mailcow API call.

use thiserror::Error;

/// Error returned by every mailcow API call
#[derive(Debug, Error)]
pub enum MailcowError {
    /// HTTP 401, the API key was rejected
    #[error("mailcow api: unauthorized")]
    Unauthorized,
    /// HTTP 400 with the backend message (or the raw body if it did not decode)
    #[error("mailcow api: bad request ({0})")]
    BadRequest(String),
    /// A `type: "danger"` record in an otherwise successful response
    #[error("mailcow api: {0}")]
    Danger(String),
    /// Connection, TLS or timeout failure
    #[error("mailcow api: transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body did not have the expected shape
    #[error("mailcow api: failed to decode response: {0}")]
    Decode(String),
}

impl MailcowError {
    /// Message reported by the backend, without the client prefix
    ///
    /// Rejections keep the backend's own wording so it can be surfaced verbatim.
    pub fn backend_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::Danger(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for MailcowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
