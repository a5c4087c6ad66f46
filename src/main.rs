//! # mailcow Controller
//!
//! Watches the mailcow custom resources and reconciles them against the mailcow
//! instances they reference.
//!
//! ## Kinds
//!
//! - `MailcowConnection`: endpoint and API key of a mailcow instance
//! - `Domain`: mail domain, quotas, rate limit and DKIM publication
//! - `DomainAdmin`: administrator scoped to a set of domains
//! - `Mailbox`: mailbox inside a domain
//! - `Alias`: forwarding address

use anyhow::Result;
use mailcow_controller::controller::reconciler::KindRegistry;
use mailcow_controller::observability::otel;
use mailcow_controller::provider::HttpConnector;
use mailcow_controller::runtime::initialization::initialize;
use mailcow_controller::runtime::watch_loop::{run_watch_loop, WatchContext};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let registry = KindRegistry::standard();

    let init = initialize(&registry).await?;

    let ctx = WatchContext {
        client: init.client.clone(),
        config: init.controller_config.clone(),
        connector: Arc::new(HttpConnector::new(init.controller_config.http_timeout())),
    };

    run_watch_loop(&registry, ctx, init.server_state.clone()).await;

    info!("Controller stopped gracefully");
    otel::shutdown_otel(init.otel_tracer_provider);

    Ok(())
}
