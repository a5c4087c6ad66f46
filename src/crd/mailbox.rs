//! # Mailbox
//!
//! A mailbox inside a mailcow domain.

use kube::core::Rule;
use serde::{Deserialize, Serialize};

/// Mailbox Custom Resource Definition
///
/// The address of the mailbox is `localPart@domain`. Display name, password and
/// `forcePasswordChange` are applied when the mailbox is created only.
///
/// # Example
///
/// ```yaml
/// apiVersion: mailcow.octopilot.io/v1
/// kind: Mailbox
/// metadata:
///   name: user-example-com
/// spec:
///   connectionRef: mailcow
///   domain: example.com
///   localPart: user
///   name: Example User
///   passwordSecret:
///     name: user-password
///     key: password
///   quota: 1024
/// ```
#[derive(kube::CustomResource, kube::KubeSchema, Debug, Clone, Deserialize, Serialize)]
#[kube(
    kind = "Mailbox",
    group = "mailcow.octopilot.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ResourceStatus",
    shortname = "mcmbx",
    printcolumn = r#"{"name":"Domain", "type":"string", "jsonPath":".spec.domain"}, {"name":"Local Part", "type":"string", "jsonPath":".spec.localPart"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MailboxSpec {
    /// Name of the MailcowConnection in the same namespace
    pub connection_ref: String,
    /// Domain of the mailbox (immutable)
    #[x_kube(validation = Rule::new("self == oldSelf").message("is immutable"))]
    pub domain: String,
    /// Part of the address before `@` (immutable)
    #[x_kube(validation = Rule::new("self == oldSelf").message("is immutable"))]
    pub local_part: String,
    /// Display name
    pub name: String,
    /// Secret key holding the initial password
    pub password_secret: crate::crd::SecretKeyRef,
    #[serde(default = "crate::crd::default_true")]
    pub active: bool,
    #[serde(default = "crate::crd::default_false")]
    pub force_password_change: bool,
    /// Mailbox quota (MiB); unset uses the domain default
    #[serde(default)]
    pub quota: Option<i64>,
}

impl MailboxSpec {
    /// Full address of the mailbox
    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}
