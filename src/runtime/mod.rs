//! # Runtime
//!
//! Process-level wiring of the controller.
//!
//! - `initialization`: logging, metrics, probe server and Kubernetes client
//! - `watch_loop`: one controller per registered kind
//! - `error_policy`: retry scheduling after a failed reconciliation

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
