//! # OpenTelemetry Support
//!
//! Optional trace export to Datadog via `datadog-opentelemetry`.
//!
//! Export is enabled when `DD_API_KEY` is present in the environment. The
//! remaining `DD_*` variables are read by the Datadog tracer itself; this
//! module only fills in service name, version and agent URL when unset.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_SERVICE_NAME: &str = "mailcow-controller";
const DEFAULT_DD_SITE: &str = "datadoghq.com";
const DEFAULT_AGENT_URL: &str = "http://localhost:8126";

/// Tracer provider handle for graceful shutdown
#[derive(Debug)]
pub struct TracerProviderHandle(opentelemetry_sdk::trace::SdkTracerProvider);

/// Initialize OpenTelemetry tracing from the environment
///
/// Returns `Ok(None)` when `DD_API_KEY` is not set.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init_otel() -> Result<Option<TracerProviderHandle>> {
    if std::env::var("DD_API_KEY").is_err() {
        if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
            warn!("OTEL_EXPORTER_OTLP_ENDPOINT is set but only Datadog export is supported");
        }
        return Ok(None);
    }

    set_default_env("DD_SERVICE", DEFAULT_SERVICE_NAME);
    set_default_env(
        "DD_VERSION",
        &format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("BUILD_GIT_HASH")),
    );
    set_default_env("DD_SITE", DEFAULT_DD_SITE);
    set_default_env("DD_TRACE_AGENT_URL", DEFAULT_AGENT_URL);

    let tracer_provider = datadog_opentelemetry::tracing().init();

    info!(
        "Datadog tracing initialized: service={}, version={}, env={:?}, agent={}",
        std::env::var("DD_SERVICE").unwrap_or_default(),
        std::env::var("DD_VERSION").unwrap_or_default(),
        std::env::var("DD_ENV").ok(),
        std::env::var("DD_TRACE_AGENT_URL").unwrap_or_default()
    );

    Ok(Some(TracerProviderHandle(tracer_provider)))
}

fn set_default_env(key: &str, value: &str) {
    if std::env::var(key).is_err() {
        std::env::set_var(key, value);
    }
}

/// Flush pending spans and shut the tracer provider down
pub fn shutdown_otel(tracer_provider: Option<TracerProviderHandle>) {
    if let Some(TracerProviderHandle(provider)) = tracer_provider {
        info!("Shutting down Datadog tracer provider...");
        if let Err(e) = provider.shutdown_with_timeout(Duration::from_secs(5)) {
            warn!("Error shutting down Datadog tracer provider: {}", e);
        }
    }
}
