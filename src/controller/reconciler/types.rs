//! # Types
//!
//! Shared context and error types of the reconcilers.

use crate::config::SharedControllerConfig;
use crate::controller::backoff::BackoffStates;
use crate::controller::reconciler::store::{
    ConfigMapStore, ObjectStore, SecretResolver, StoreError,
};
use crate::crd::MailcowConnection;
use crate::provider::mailcow::MailcowError;
use crate::provider::MailcowConnector;
use std::sync::Arc;
use thiserror::Error;

/// Condition reasons reported on `Degraded`
pub mod reasons {
    pub const REFERENCE_ERROR: &str = "ReferenceError";
    pub const AUTH_ERROR: &str = "AuthError";
    pub const REMOTE_REJECTION: &str = "RemoteRejection";
    pub const NETWORK_ERROR: &str = "NetworkError";
    pub const PERSIST_CONFLICT: &str = "PersistConflict";
    pub const STORE_ERROR: &str = "StoreError";
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// A referenced connection or secret is missing or unusable
    #[error("reference error: {0}")]
    Reference(String),
    #[error(transparent)]
    Remote(#[from] MailcowError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReconcilerError {
    /// Condition reason for this error
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Reference(_) => reasons::REFERENCE_ERROR,
            Self::Remote(MailcowError::Unauthorized) => reasons::AUTH_ERROR,
            Self::Remote(MailcowError::BadRequest(_) | MailcowError::Danger(_)) => {
                reasons::REMOTE_REJECTION
            }
            Self::Remote(MailcowError::Transport(_) | MailcowError::Decode(_)) => {
                reasons::NETWORK_ERROR
            }
            Self::Store(StoreError::Conflict(_)) => reasons::PERSIST_CONFLICT,
            Self::Store(_) => reasons::STORE_ERROR,
        }
    }

    /// Condition message for this error; backend rejections are kept verbatim
    pub fn message(&self) -> String {
        match self {
            Self::Remote(e) => e.backend_message(),
            other => other.to_string(),
        }
    }

    /// Stale write; the pass should re-run right away
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::Conflict(_)))
    }
}

/// Context shared by all reconciliations of one kind
pub struct Reconciler<K> {
    pub objects: Arc<dyn ObjectStore<K>>,
    pub connections: Arc<dyn ObjectStore<MailcowConnection>>,
    pub secrets: Arc<dyn SecretResolver>,
    pub config_maps: Arc<dyn ConfigMapStore>,
    pub connector: Arc<dyn MailcowConnector>,
    pub config: SharedControllerConfig,
    pub backoff: BackoffStates,
}

impl<K> Reconciler<K> {
    pub fn new(
        objects: Arc<dyn ObjectStore<K>>,
        connections: Arc<dyn ObjectStore<MailcowConnection>>,
        secrets: Arc<dyn SecretResolver>,
        config_maps: Arc<dyn ConfigMapStore>,
        connector: Arc<dyn MailcowConnector>,
        config: SharedControllerConfig,
    ) -> Self {
        let backoff = BackoffStates::new(config.backoff_min_minutes, config.backoff_max_minutes);
        Self {
            objects,
            connections,
            secrets,
            config_maps,
            connector,
            config,
            backoff,
        }
    }
}
