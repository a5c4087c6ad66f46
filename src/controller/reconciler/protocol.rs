//! # Reconciliation Protocol
//!
//! The pass every mailcow-backed kind goes through.
//!
//! ## Flow
//!
//! 1. Load the object; a vanished object ends the pass
//! 2. Add the finalizer and re-run
//! 3. Mark `Progressing` (unless already `Ready` for this generation) and re-run
//! 4. Resolve the connection and look the object up by its identity key
//! 5. Deleting: delete the remote object if it exists, then drop the finalizer
//! 6. Otherwise create it, or update the mutable fields when they drifted
//! 7. Run kind-specific follow-ups (DKIM publication for domains)
//! 8. Mark `Ready`, or `Degraded` with the failure and hand the error back
//!
//! Kinds plug into the flow by implementing [`MailcowResource`].

use crate::controller::reconciler::conditions::{self, ConditionType};
use crate::controller::reconciler::connection::resolve_connection;
use crate::controller::reconciler::finalizer::{add_finalizer, has_finalizer, remove_finalizer};
use crate::controller::reconciler::store::{ConfigMapStore, SecretResolver};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::ResourceStatus;
use crate::observability::metrics;
use crate::provider::MailcowApi;
use async_trait::async_trait;
use kube::core::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

pub const REASON_RECONCILING: &str = "Reconciling";
pub const REASON_RECONCILED: &str = "Reconciled";

/// Everything a kind needs to talk to the backend during one pass
pub struct SyncContext<'a> {
    pub api: &'a dyn MailcowApi,
    pub secrets: &'a dyn SecretResolver,
    pub config_maps: &'a dyn ConfigMapStore,
}

/// A custom resource mirrored into mailcow
#[async_trait]
pub trait MailcowResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Send
    + Sync
    + 'static
{
    /// Record returned by the backend lookup
    type Remote: Send + Sync;

    const KIND: &'static str;

    fn status(&self) -> Option<&ResourceStatus>;
    fn status_mut(&mut self) -> &mut ResourceStatus;

    /// Name of the MailcowConnection in the object's namespace
    fn connection_ref(&self) -> &str;

    /// Key the backend knows the object by
    fn identity_key(&self) -> String;

    /// Look the object up; `None` when the backend has no such object
    async fn fetch(&self, ctx: &SyncContext<'_>) -> Result<Option<Self::Remote>, ReconcilerError>;

    /// Create with the full desired state
    async fn create(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError>;

    /// Whether the mutable fields of `remote` already match the desired state
    fn in_sync(&self, remote: &Self::Remote) -> bool;

    /// Send the mutable fields that drifted
    async fn update(
        &self,
        ctx: &SyncContext<'_>,
        remote: &Self::Remote,
    ) -> Result<(), ReconcilerError>;

    async fn delete(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError>;

    /// Runs after a successful create or update
    async fn post_sync(&self, _ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        Ok(())
    }
}

/// Key used for per-object state such as backoff
pub fn object_key<K: Resource>(object: &K) -> String {
    format!(
        "{}/{}",
        object.meta().namespace.as_deref().unwrap_or_default(),
        object.meta().name.as_deref().unwrap_or_default()
    )
}

/// Entry point handed to the kind's controller
pub async fn reconcile<K: MailcowResource>(
    object: Arc<K>,
    ctx: Arc<Reconciler<K>>,
) -> Result<Action, ReconcilerError> {
    let name = object.name_any();
    let namespace = object.namespace().unwrap_or_default();
    let span = tracing::info_span!(
        "reconcile",
        resource.kind = K::KIND,
        resource.name = %name,
        resource.namespace = %namespace,
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations(K::KIND);

        let result = run_pass(&namespace, &name, &ctx).await;

        metrics::observe_reconciliation_duration(K::KIND, start.elapsed().as_secs_f64());
        result
    }
    .instrument(span)
    .await
}

async fn run_pass<K: MailcowResource>(
    namespace: &str,
    name: &str,
    ctx: &Reconciler<K>,
) -> Result<Action, ReconcilerError> {
    let Some(mut current) = ctx.objects.load(namespace, name).await? else {
        debug!("{} {}/{} no longer exists", K::KIND, namespace, name);
        ctx.backoff.reset(&format!("{namespace}/{name}"));
        return Ok(Action::await_change());
    };

    let deleting = current.meta().deletion_timestamp.is_some();
    let generation = current.meta().generation;

    if deleting && !has_finalizer(&current) {
        debug!("{} {}/{} is being deleted without our finalizer", K::KIND, namespace, name);
        return Ok(Action::await_change());
    }

    if !deleting && add_finalizer(&mut current) {
        ctx.objects.persist_meta(&current).await?;
        debug!("Added finalizer to {} {}/{}", K::KIND, namespace, name);
        return Ok(Action::requeue(Duration::ZERO));
    }

    if !deleting && !conditions::is_ready_for(current.status(), generation) {
        let message = format!("Reconciling {}", K::KIND);
        if conditions::mark(
            current.status_mut(),
            ConditionType::Progressing,
            REASON_RECONCILING,
            &message,
            generation,
        ) {
            ctx.objects.persist_status(&current).await?;
            return Ok(Action::requeue(Duration::ZERO));
        }
    }

    if let Err(err) = converge(&current, ctx, deleting).await {
        warn!(
            "Reconciliation of {} {}/{} failed: {}",
            K::KIND,
            namespace,
            name,
            err
        );
        if conditions::mark(
            current.status_mut(),
            ConditionType::Degraded,
            err.reason(),
            &err.message(),
            generation,
        ) {
            if let Err(persist_err) = ctx.objects.persist_status(&current).await {
                warn!(
                    "Failed to record Degraded on {} {}/{}: {}",
                    K::KIND,
                    namespace,
                    name,
                    persist_err
                );
            }
        }
        return Err(err);
    }

    if deleting {
        remove_finalizer(&mut current);
        ctx.objects.persist_meta(&current).await?;
        metrics::increment_finalizer_removals(K::KIND);
        ctx.backoff.reset(&object_key(&current));
        info!("Finalized {} {}/{}", K::KIND, namespace, name);
        return Ok(Action::await_change());
    }

    let message = format!("{} successfully reconciled", K::KIND);
    if conditions::mark(
        current.status_mut(),
        ConditionType::Ready,
        REASON_RECONCILED,
        &message,
        generation,
    ) {
        ctx.objects.persist_status(&current).await?;
        info!("{} {}/{} is Ready", K::KIND, namespace, name);
    }

    if ctx.backoff.reset(&object_key(&current)) {
        debug!("Reset backoff of {} {}/{}", K::KIND, namespace, name);
    }
    Ok(Action::requeue(ctx.config.resync_interval()))
}

async fn converge<K: MailcowResource>(
    object: &K,
    ctx: &Reconciler<K>,
    deleting: bool,
) -> Result<(), ReconcilerError> {
    let namespace = object.namespace().unwrap_or_default();
    let api = resolve_connection(
        ctx.connections.as_ref(),
        ctx.secrets.as_ref(),
        ctx.connector.as_ref(),
        &namespace,
        object.connection_ref(),
    )
    .await?;

    let sync = SyncContext {
        api: api.as_ref(),
        secrets: ctx.secrets.as_ref(),
        config_maps: ctx.config_maps.as_ref(),
    };

    let identity = object.identity_key();
    let remote = object.fetch(&sync).await?;

    if deleting {
        match remote {
            Some(_) => {
                object.delete(&sync).await?;
                info!("Deleted {} {} from mailcow", K::KIND, identity);
            }
            None => debug!("{} {} is already absent from mailcow", K::KIND, identity),
        }
        return Ok(());
    }

    match remote {
        None => {
            object.create(&sync).await?;
            info!("Created {} {} in mailcow", K::KIND, identity);
        }
        Some(remote) if !object.in_sync(&remote) => {
            object.update(&sync, &remote).await?;
            info!("Updated {} {} in mailcow", K::KIND, identity);
        }
        Some(_) => debug!("{} {} is up to date", K::KIND, identity),
    }

    object.post_sync(&sync).await
}
