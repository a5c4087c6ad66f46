//! # Conditions
//!
//! State transitions over a resource's condition set.
//!
//! `Ready`, `Progressing` and `Degraded` are mutually exclusive: setting one
//! to `True` forces every other one already present to `False` while keeping
//! its last reason and message.

use crate::crd::{Condition, ResourceStatus};

/// The three well-known condition types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    Ready,
    Progressing,
    Degraded,
}

impl ConditionType {
    pub const ALL: [ConditionType; 3] = [Self::Ready, Self::Progressing, Self::Degraded];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Progressing => "Progressing",
            Self::Degraded => "Degraded",
        }
    }
}

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";

/// Set a condition and demote the other well-known ones
///
/// `lastTransitionTime` only moves when the status of a condition flips.
/// Returns whether the named condition's status, reason or message changed.
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: ConditionType,
    status: &str,
    reason: &str,
    message: &str,
    generation: Option<i64>,
) -> bool {
    let now = chrono::Utc::now().to_rfc3339();

    let changed = match conditions
        .iter_mut()
        .find(|c| c.r#type == condition_type.as_str())
    {
        Some(existing) => {
            let changed = existing.status != status
                || existing.reason.as_deref() != Some(reason)
                || existing.message.as_deref() != Some(message);
            if existing.status != status {
                existing.last_transition_time = Some(now.clone());
            }
            existing.status = status.to_string();
            existing.reason = Some(reason.to_string());
            existing.message = Some(message.to_string());
            existing.observed_generation = generation;
            changed
        }
        None => {
            conditions.push(Condition {
                r#type: condition_type.as_str().to_string(),
                status: status.to_string(),
                reason: Some(reason.to_string()),
                message: Some(message.to_string()),
                observed_generation: generation,
                last_transition_time: Some(now.clone()),
            });
            true
        }
    };

    for other in ConditionType::ALL
        .into_iter()
        .filter(|t| *t != condition_type)
    {
        if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == other.as_str()) {
            if existing.status != STATUS_FALSE {
                existing.status = STATUS_FALSE.to_string();
                existing.last_transition_time = Some(now.clone());
            }
            existing.observed_generation = generation;
        }
    }

    changed
}

/// Make `condition_type` the active condition and mirror it into `phase`
pub fn mark(
    status: &mut ResourceStatus,
    condition_type: ConditionType,
    reason: &str,
    message: &str,
    generation: Option<i64>,
) -> bool {
    let changed = set_condition(
        &mut status.conditions,
        condition_type,
        STATUS_TRUE,
        reason,
        message,
        generation,
    );
    let phase_changed = status.phase.as_deref() != Some(condition_type.as_str());
    status.phase = Some(condition_type.as_str().to_string());
    changed || phase_changed
}

/// Whether the resource is `Ready` for the given generation
pub fn is_ready_for(status: Option<&ResourceStatus>, generation: Option<i64>) -> bool {
    status
        .and_then(|s| s.condition(ConditionType::Ready.as_str()))
        .is_some_and(|c| c.is_true() && c.observed_generation == generation)
}
