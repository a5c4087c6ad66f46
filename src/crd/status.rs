//! # Resource Status
//!
//! Status shared by every mailcow custom resource.

use serde::{Deserialize, Serialize};

/// Status of a mailcow custom resource
///
/// `phase` mirrors whichever of the well-known conditions is currently `True`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    /// Current phase of reconciliation
    /// Values: Progressing, Ready, Degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (Ready, Progressing, Degraded)
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Machine-readable reason for the last transition
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Generation of the resource this condition was computed against
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Last time the status flipped (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Whether the condition status is `True`
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

impl ResourceStatus {
    /// Look up a condition by type
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}
