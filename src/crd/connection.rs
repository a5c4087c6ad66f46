//! # MailcowConnection
//!
//! Endpoint and credentials of a mailcow instance.

use serde::{Deserialize, Serialize};

/// MailcowConnection Custom Resource Definition
///
/// Every other kind names a connection in its own namespace through
/// `spec.connectionRef`.
///
/// # Example
///
/// ```yaml
/// apiVersion: mailcow.octopilot.io/v1
/// kind: MailcowConnection
/// metadata:
///   name: mailcow
///   namespace: mail
/// spec:
///   endpoint: https://mail.example.com
///   apiKeySecret:
///     name: mailcow-api
///     key: api-key
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "MailcowConnection",
    group = "mailcow.octopilot.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ResourceStatus",
    shortname = "mcc",
    printcolumn = r#"{"name":"Endpoint", "type":"string", "jsonPath":".spec.endpoint"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MailcowConnectionSpec {
    /// Base URL of the mailcow instance, without the `/api/v1` suffix
    pub endpoint: String,
    /// Secret key holding the mailcow API key
    pub api_key_secret: crate::crd::SecretKeyRef,
}
