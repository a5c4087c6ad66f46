//! # Reconciler
//!
//! Convergence of the mailcow custom resources onto a mailcow instance.
//!
//! Every kind except `MailcowConnection` runs the shared pass in `protocol`:
//! finalizer first, then a `Progressing` marker, then create, update or delete
//! in mailcow, and finally `Ready` or `Degraded`. Connections only verify that
//! the instance is reachable with the configured API key.
//!
//! ## Module Structure
//!
//! - `protocol.rs` - The shared pass and the `MailcowResource` trait
//! - `kinds/` - One `MailcowResource` implementation per kind
//! - `dkim.rs` - DKIM key generation and ConfigMap publication
//! - `conditions.rs` - Ready/Progressing/Degraded bookkeeping
//! - `store.rs` - Kubernetes-side collaborators
//! - `connection.rs` - Connection and secret resolution
//! - `registry.rs` - The list of kinds the controller runs

pub mod conditions;
pub mod connection;
pub mod converters;
pub mod dkim;
pub mod finalizer;
pub mod kinds;
pub mod protocol;
pub mod registry;
pub mod store;
pub mod types;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
pub(crate) mod testing;

pub use protocol::{reconcile, MailcowResource, SyncContext};
pub use registry::{KindRegistry, KindSpec};
pub use store::{
    ConfigMapStore, KubeConfigMapStore, KubeObjectStore, KubeSecretResolver, ObjectStore,
    SecretResolver, StoreError,
};
pub use types::{Reconciler, ReconcilerError};
