//! # MailcowConnection
//!
//! Connections own nothing in mailcow, so they carry no finalizer. A pass
//! resolves the API key, calls `GET /get/status/version` and reports the
//! outcome on the connection's own status.

use crate::controller::reconciler::conditions::{self, ConditionType};
use crate::controller::reconciler::connection::connect;
use crate::controller::reconciler::protocol::object_key;
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::{MailcowConnection, ResourceStatus};
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

pub const KIND: &str = "MailcowConnection";
pub const REASON_CONNECTED: &str = "Connected";

async fn check_version(
    connection: &MailcowConnection,
    namespace: &str,
    ctx: &Reconciler<MailcowConnection>,
) -> Result<String, ReconcilerError> {
    let api = connect(
        connection,
        namespace,
        ctx.secrets.as_ref(),
        ctx.connector.as_ref(),
    )
    .await?;
    let version = api.get_version().await?;
    Ok(version.version.unwrap_or_else(|| "unknown".to_string()))
}

pub async fn reconcile_connection(
    object: Arc<MailcowConnection>,
    ctx: Arc<Reconciler<MailcowConnection>>,
) -> Result<Action, ReconcilerError> {
    let name = object.name_any();
    let namespace = object.namespace().unwrap_or_default();
    let span = tracing::info_span!(
        "reconcile",
        resource.kind = KIND,
        resource.name = %name,
        resource.namespace = %namespace,
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations(KIND);
        let result = run_pass(&namespace, &name, &ctx).await;
        metrics::observe_reconciliation_duration(KIND, start.elapsed().as_secs_f64());
        result
    }
    .instrument(span)
    .await
}

async fn run_pass(
    namespace: &str,
    name: &str,
    ctx: &Reconciler<MailcowConnection>,
) -> Result<Action, ReconcilerError> {
    let Some(mut current) = ctx.objects.load(namespace, name).await? else {
        debug!("{} {}/{} no longer exists", KIND, namespace, name);
        return Ok(Action::await_change());
    };
    if current.metadata.deletion_timestamp.is_some() {
        return Ok(Action::await_change());
    }

    let generation = current.metadata.generation;
    let result = check_version(&current, namespace, ctx).await;
    let status = current.status.get_or_insert_with(ResourceStatus::default);

    match result {
        Ok(version) => {
            let message = format!("Connected to mailcow {version}");
            if conditions::mark(
                status,
                ConditionType::Ready,
                REASON_CONNECTED,
                &message,
                generation,
            ) {
                ctx.objects.persist_status(&current).await?;
                info!("{} {}/{}: {}", KIND, namespace, name, message);
            }
            ctx.backoff.reset(&object_key(&current));
            Ok(Action::requeue(ctx.config.resync_interval()))
        }
        Err(err) => {
            warn!("{} {}/{} is unusable: {}", KIND, namespace, name, err);
            if conditions::mark(
                status,
                ConditionType::Degraded,
                err.reason(),
                &err.message(),
                generation,
            ) {
                if let Err(persist_err) = ctx.objects.persist_status(&current).await {
                    warn!(
                        "Failed to record Degraded on {} {}/{}: {}",
                        KIND, namespace, name, persist_err
                    );
                }
            }
            Err(err)
        }
    }
}
