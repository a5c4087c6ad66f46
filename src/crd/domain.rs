//! # Domain
//!
//! A mail domain hosted by mailcow.

use kube::core::Rule;
use serde::{Deserialize, Serialize};

/// Domain Custom Resource Definition
///
/// Quotas are expressed in MiB. The DKIM key of the domain is published to a
/// ConfigMap named `dkim-<metadata.name>` owned by this resource.
///
/// # Example
///
/// ```yaml
/// apiVersion: mailcow.octopilot.io/v1
/// kind: Domain
/// metadata:
///   name: example-com
/// spec:
///   connectionRef: mailcow
///   domain: example.com
///   quota: 10240
///   maxQuota: 2048
///   defaultQuota: 1024
///   maxMailboxes: 50
///   rateLimit: 100
///   rateLimitFrame: h
/// ```
#[derive(kube::CustomResource, kube::KubeSchema, Debug, Clone, Deserialize, Serialize)]
#[kube(
    kind = "Domain",
    group = "mailcow.octopilot.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ResourceStatus",
    shortname = "mcdom",
    printcolumn = r#"{"name":"Domain", "type":"string", "jsonPath":".spec.domain"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DomainSpec {
    /// Name of the MailcowConnection in the same namespace
    pub connection_ref: String,
    /// Fully qualified domain name (immutable)
    #[x_kube(validation = Rule::new("self == oldSelf").message("is immutable"))]
    pub domain: String,
    #[serde(default)]
    pub description: String,
    /// Total quota of the domain (MiB)
    pub quota: i64,
    /// Maximum quota of a single mailbox (MiB)
    pub max_quota: i64,
    /// Quota given to new mailboxes (MiB)
    pub default_quota: i64,
    pub max_mailboxes: i64,
    /// Outgoing message rate limit; unset disables rate limiting
    #[serde(default)]
    pub rate_limit: Option<i64>,
    #[serde(default)]
    pub rate_limit_frame: RateLimitFrame,
    #[serde(default = "crate::crd::default_true")]
    pub active: bool,
}

/// Time frame of a domain rate limit
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema,
)]
pub enum RateLimitFrame {
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "m")]
    Minute,
    #[default]
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "d")]
    Day,
}

impl RateLimitFrame {
    /// Single-letter form used by the mailcow API
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
        }
    }
}
