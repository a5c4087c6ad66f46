//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use mailcow_controller::prelude::*;
//! ```
//!
//! This brings into scope:
//! - All CRD types (Domain, Mailbox, MailcowConnection, etc.)
//! - The mailcow API traits and client
//! - Reconciler types (Reconciler, ReconcilerError, MailcowResource)
//! - Config types (ControllerConfig, ServerConfig)

// CRD types - most commonly used
pub use crate::crd::*;

// mailcow backend
pub use crate::provider::mailcow::{MailcowClient, MailcowError};
pub use crate::provider::{HttpConnector, MailcowApi, MailcowConnector};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, KindRegistry, MailcowResource, Reconciler, ReconcilerError, StoreError,
};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, ServerConfig, SharedControllerConfig};
