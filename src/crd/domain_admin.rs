//! # DomainAdmin
//!
//! A mailcow administrator scoped to a set of domains.

use kube::core::Rule;
use serde::{Deserialize, Serialize};

/// DomainAdmin Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: mailcow.octopilot.io/v1
/// kind: DomainAdmin
/// metadata:
///   name: example-admin
/// spec:
///   connectionRef: mailcow
///   username: example-admin
///   passwordSecret:
///     name: example-admin-password
///     key: password
///   domains:
///     - example.com
/// ```
#[derive(kube::CustomResource, kube::KubeSchema, Debug, Clone, Deserialize, Serialize)]
#[kube(
    kind = "DomainAdmin",
    group = "mailcow.octopilot.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ResourceStatus",
    shortname = "mcda",
    printcolumn = r#"{"name":"Username", "type":"string", "jsonPath":".spec.username"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DomainAdminSpec {
    /// Name of the MailcowConnection in the same namespace
    pub connection_ref: String,
    /// Login name of the administrator (immutable)
    #[x_kube(validation = Rule::new("self == oldSelf").message("is immutable"))]
    pub username: String,
    /// Secret key holding the initial password
    pub password_secret: crate::crd::SecretKeyRef,
    #[serde(default = "crate::crd::default_true")]
    pub active: bool,
    /// Domains the administrator manages
    #[serde(default)]
    pub domains: Vec<String>,
}
