//! # Error Policy
//!
//! Decides when a failed object is retried.
//!
//! Stale writes are retried right away. Every other failure waits according to
//! the object's own Fibonacci backoff, which is reset by the next successful pass.

use crate::controller::reconciler::protocol::object_key;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::observability;
use kube::Resource;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Error policy shared by every kind's controller
pub fn handle_reconciliation_error<K>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler<K>>,
) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&());
    let key = object_key(obj.as_ref());

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource.kind = %kind,
        resource.key = %key,
        error.reason = error.reason(),
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors(&kind, error.reason());

    if error.is_conflict() {
        debug!("{} {} was modified concurrently, retrying now", kind, key);
        return Action::requeue(Duration::ZERO);
    }

    let (delay, error_count) = ctx.backoff.record_failure(&key);
    error!("Reconciliation error for {} {}: {}", kind, key, error);
    info!(
        "Retrying {} {} in {}s (error count: {})",
        kind,
        key,
        delay.as_secs(),
        error_count
    );
    Action::requeue(delay)
}
