//! # References
//!
//! Pointers from a custom resource to other objects in its namespace.

use serde::{Deserialize, Serialize};

/// Selects a key of a Secret in the same namespace as the referencing resource
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyRef {
    /// Name of the Secret
    pub name: String,
    /// Key within the Secret's data
    pub key: String,
}

impl std::fmt::Display for SecretKeyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.key)
    }
}
