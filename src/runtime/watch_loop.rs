//! # Watch Loop
//!
//! One kube-runtime `Controller` per kind. The controller deduplicates queued
//! objects and never runs two passes for the same object at once; the number of
//! objects reconciled in parallel is capped by `MAX_CONCURRENT_RECONCILIATIONS`.

use crate::config::SharedControllerConfig;
use crate::controller::reconciler::kinds::reconcile_connection;
use crate::controller::reconciler::registry::KindRegistry;
use crate::controller::reconciler::{
    reconcile, KubeConfigMapStore, KubeObjectStore, KubeSecretResolver, MailcowResource,
    Reconciler, ReconcilerError,
};
use crate::controller::server::ServerState;
use crate::crd::MailcowConnection;
use crate::provider::MailcowConnector;
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::future::BoxFuture;
use futures::StreamExt;
use kube::api::{Api, ListParams};
use kube::core::NamespaceResourceScope;
use kube::{Client, Resource};
use kube_runtime::controller::{self, Action};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What every kind's controller is built from
#[derive(Clone)]
pub struct WatchContext {
    pub client: Client,
    pub config: SharedControllerConfig,
    pub connector: Arc<dyn MailcowConnector>,
}

impl Debug for WatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn api_for<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    }
}

fn reconciler_for<K>(ctx: &WatchContext) -> Arc<Reconciler<K>>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static,
{
    Arc::new(Reconciler::new(
        Arc::new(KubeObjectStore::<K>::new(ctx.client.clone())),
        Arc::new(KubeObjectStore::<MailcowConnection>::new(ctx.client.clone())),
        Arc::new(KubeSecretResolver::new(ctx.client.clone())),
        Arc::new(KubeConfigMapStore::new(ctx.client.clone())),
        ctx.connector.clone(),
        ctx.config.clone(),
    ))
}

fn controller_config(ctx: &WatchContext) -> controller::Config {
    controller::Config::default().concurrency(ctx.config.max_concurrent_reconciliations)
}

fn log_result<K>(
    kind: &str,
    result: Result<(ObjectRef<K>, Action), controller::Error<ReconcilerError, watcher::Error>>,
) where
    K: Resource<DynamicType = ()>,
{
    match result {
        Ok((object, action)) => debug!("{} {} reconciled: {:?}", kind, object, action),
        // Already logged and counted by the error policy
        Err(controller::Error::ReconcilerFailed(err, _)) => {
            debug!("{} reconciliation failed: {}", kind, err);
        }
        Err(controller::Error::ObjectNotFound(_)) => {
            debug!("{} object vanished before it could be reconciled", kind);
        }
        Err(e) => warn!("{} controller error: {}", kind, e),
    }
}

/// Run the controller of a mailcow-backed kind until shutdown
pub fn run_kind_controller<K>(ctx: WatchContext) -> BoxFuture<'static, ()>
where
    K: MailcowResource + DeserializeOwned + Serialize,
{
    Box::pin(async move {
        let api = api_for::<K>(ctx.client.clone(), ctx.config.watch_namespace.as_deref());
        let reconciler = reconciler_for::<K>(&ctx);

        info!("Starting {} controller", K::KIND);
        Controller::new(api, watcher::Config::default().any_semantic())
            .with_config(controller_config(&ctx))
            .shutdown_on_signal()
            .run(reconcile::<K>, handle_reconciliation_error::<K>, reconciler)
            .for_each(|result| {
                log_result(K::KIND, result);
                futures::future::ready(())
            })
            .await;
        info!("{} controller stopped", K::KIND);
    })
}

/// Run the MailcowConnection controller until shutdown
pub fn run_connection_controller(ctx: WatchContext) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let kind = "MailcowConnection";
        let api = api_for::<MailcowConnection>(
            ctx.client.clone(),
            ctx.config.watch_namespace.as_deref(),
        );
        let reconciler = reconciler_for::<MailcowConnection>(&ctx);

        info!("Starting {} controller", kind);
        Controller::new(api, watcher::Config::default().any_semantic())
            .with_config(controller_config(&ctx))
            .shutdown_on_signal()
            .run(
                reconcile_connection,
                handle_reconciliation_error::<MailcowConnection>,
                reconciler,
            )
            .for_each(|result| {
                log_result(kind, result);
                futures::future::ready(())
            })
            .await;
        info!("{} controller stopped", kind);
    })
}

/// Count the existing objects of a kind
pub fn count_objects<K>(
    client: Client,
    namespace: Option<String>,
) -> BoxFuture<'static, Result<usize, kube::Error>>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
{
    Box::pin(async move {
        let api = api_for::<K>(client, namespace.as_deref());
        Ok(api.list_metadata(&ListParams::default()).await?.items.len())
    })
}

/// Run every registered kind until shutdown
///
/// SIGTERM/SIGINT marks the process not ready; the controllers stop taking new
/// work and drain the passes already in flight.
pub async fn run_watch_loop(
    registry: &KindRegistry,
    ctx: WatchContext,
    server_state: Arc<ServerState>,
) {
    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, draining in-flight reconciliations...");
            shutdown_state.set_ready(false);
        }
    });

    let controllers = registry.iter().map(|spec| (spec.run)(ctx.clone()));
    futures::future::join_all(controllers).await;

    info!("All controllers stopped");
}
