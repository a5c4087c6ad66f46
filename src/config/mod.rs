//! # Configuration
//!
//! Controller and server settings, read once from the environment at startup.

mod controller;
mod server;

pub use controller::ControllerConfig;
pub use server::ServerConfig;

use std::sync::Arc;

/// Controller configuration shared between the per-kind controllers
pub type SharedControllerConfig = Arc<ControllerConfig>;
