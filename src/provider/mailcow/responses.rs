//! # Response Types
//!
//! Records returned by the mailcow API.
//!
//! mailcow is loose with scalar types: the same field can come back as `1`,
//! `"1"` or `true` depending on the endpoint and version, so every scalar is
//! decoded through the lenient helpers below.

use super::response::Identified;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `GET /get/domain/<domain>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainRecord {
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Bytes
    #[serde(default, deserialize_with = "lenient_i64")]
    pub max_quota_for_domain: Option<i64>,
    /// Bytes
    #[serde(default, deserialize_with = "lenient_i64")]
    pub max_quota_for_mbox: Option<i64>,
    /// Bytes
    #[serde(default, deserialize_with = "lenient_i64")]
    pub def_quota_for_mbox: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub max_num_mboxes_for_domain: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: Option<bool>,
    /// `false` when no rate limit is configured
    #[serde(default, deserialize_with = "rate_limit")]
    pub rl: Option<RateLimitRecord>,
}

impl Identified for DomainRecord {
    fn identity(&self) -> Option<&str> {
        self.domain_name.as_deref()
    }
}

/// Rate limit block of a domain record
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RateLimitRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub value: Option<i64>,
    #[serde(default)]
    pub frame: Option<String>,
}

/// `GET /get/dkim/<domain>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DkimRecord {
    #[serde(default)]
    pub dkim_selector: Option<String>,
    #[serde(default)]
    pub dkim_txt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub length: Option<String>,
    #[serde(default)]
    pub pubkey: Option<String>,
}

/// Any published field counts; mailcow may omit the TXT value right after generation
impl Identified for DkimRecord {
    fn identity(&self) -> Option<&str> {
        [&self.dkim_txt, &self.dkim_selector, &self.pubkey, &self.length]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }
}

/// One entry of `GET /get/domain-admin/all`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainAdminRecord {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "string_list")]
    pub selected_domains: Vec<String>,
}

impl Identified for DomainAdminRecord {
    fn identity(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// `GET /get/mailbox/<address>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailboxRecord {
    /// Full address of the mailbox
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: Option<bool>,
    /// Bytes, `0` means unlimited
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quota: Option<i64>,
}

impl Identified for MailboxRecord {
    fn identity(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// `GET /get/alias/<address>`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasRecord {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub goto: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: Option<bool>,
}

impl Identified for AliasRecord {
    fn identity(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// `GET /get/status/version`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionRecord {
    #[serde(default)]
    pub version: Option<String>,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

fn rate_limit<'de, D>(deserializer: D) -> Result<Option<RateLimitRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
