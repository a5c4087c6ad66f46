//! # Alias
//!
//! An address that forwards to one or more destinations.

use kube::core::Rule;
use serde::{Deserialize, Serialize};

/// Alias Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: mailcow.octopilot.io/v1
/// kind: Alias
/// metadata:
///   name: info-example-com
/// spec:
///   connectionRef: mailcow
///   address: info@example.com
///   goto: user@example.com
/// ```
#[derive(kube::CustomResource, kube::KubeSchema, Debug, Clone, Deserialize, Serialize)]
#[kube(
    kind = "Alias",
    group = "mailcow.octopilot.io",
    version = "v1",
    namespaced,
    status = "crate::crd::ResourceStatus",
    shortname = "mcalias",
    printcolumn = r#"{"name":"Address", "type":"string", "jsonPath":".spec.address"}, {"name":"Goto", "type":"string", "jsonPath":".spec.goto"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AliasSpec {
    /// Name of the MailcowConnection in the same namespace
    pub connection_ref: String,
    /// Alias address (immutable)
    #[x_kube(validation = Rule::new("self == oldSelf").message("is immutable"))]
    pub address: String,
    /// Destination address(es), comma separated
    pub goto: String,
    #[serde(default = "crate::crd::default_true")]
    pub active: bool,
}
