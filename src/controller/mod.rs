//! # Controller
//!
//! Core controller modules for the mailcow controller.
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `reconciler`: Convergence protocol and the per-kind reconcilers
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
