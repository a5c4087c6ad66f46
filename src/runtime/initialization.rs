//! # Initialization
//!
//! Controller startup: rustls, OpenTelemetry, tracing, metrics, the probe
//! server and the Kubernetes client. Ends with a summary of the objects that
//! already exist for every registered kind.

use crate::config::{ControllerConfig, ServerConfig, SharedControllerConfig};
use crate::controller::reconciler::registry::KindRegistry;
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::observability::otel::TracerProviderHandle;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

/// Everything the watch loop needs once startup succeeded
pub struct InitializationResult {
    pub client: Client,
    pub server_state: Arc<ServerState>,
    pub otel_tracer_provider: Option<TracerProviderHandle>,
    pub controller_config: SharedControllerConfig,
    pub server_config: ServerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Default filter when `RUST_LOG` is not set
fn default_filter(log_level: &str) -> String {
    format!("mailcow_controller={}", log_level.to_ascii_lowercase())
}

fn init_tracing(config: &ControllerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    // datadog-opentelemetry may already have installed a subscriber
    if let Err(e) = result {
        warn!("Tracing subscriber already initialized: {}", e);
    }
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails when the crypto provider, metrics registry, probe server or
/// Kubernetes client cannot be set up.
pub async fn initialize(registry: &KindRegistry) -> Result<InitializationResult> {
    // Must happen before any TLS client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let controller_config = Arc::new(ControllerConfig::from_env());
    let server_config = ServerConfig::from_env();

    let otel_tracer_provider =
        observability::otel::init_otel().context("Failed to initialize OpenTelemetry")?;
    init_tracing(&controller_config);

    info!("Starting mailcow controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        "Configuration: resync={}s, http_timeout={}s, concurrency={}, backoff={}-{}m, namespace={}",
        controller_config.resync_interval_secs,
        controller_config.http_timeout_secs,
        controller_config.max_concurrent_reconciliations,
        controller_config.backoff_min_minutes,
        controller_config.backoff_max_minutes,
        controller_config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    if controller_config.enable_metrics {
        observability::metrics::register_metrics()?;
    } else {
        info!("Metrics disabled, /metrics will be empty");
    }

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = server_state.clone();
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {:#}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    summarize_existing_resources(registry, &client, &controller_config).await;

    info!(
        "Controller initialized, starting {} controllers...",
        registry.len()
    );

    Ok(InitializationResult {
        client,
        server_state,
        otel_tracer_provider,
        controller_config,
        server_config,
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = std::time::Duration::from_secs(server_config.startup_timeout_secs);
    let poll_interval = std::time::Duration::from_millis(server_config.poll_interval_ms);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Log how many objects of each kind exist before the watches start
///
/// A kind that cannot be listed (usually a missing CRD) is reported and skipped;
/// its controller will surface the same problem once it starts.
async fn summarize_existing_resources(
    registry: &KindRegistry,
    client: &Client,
    config: &ControllerConfig,
) {
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.startup.summary",
        operation = "summarize_existing_resources"
    );

    async {
        for spec in registry.iter() {
            match (spec.count)(client.clone(), config.watch_namespace.clone()).await {
                Ok(count) => {
                    info!("Found {} existing {} resources", count, spec.kind);
                    observability::metrics::set_managed_resources(
                        spec.kind,
                        i64::try_from(count).unwrap_or(i64::MAX),
                    );
                }
                Err(e) => warn!(
                    "Cannot list {} resources (is the CRD installed?): {}",
                    spec.kind, e
                ),
            }
        }
    }
    .instrument(span)
    .await;
}
