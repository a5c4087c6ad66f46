//! # Connection Resolution
//!
//! Turns a `connectionRef` into an authenticated mailcow API handle.
//! Nothing is cached; every pass resolves the connection and its API key again.

use crate::controller::reconciler::store::{ObjectStore, SecretResolver, StoreError};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{MailcowConnection, SecretKeyRef};
use crate::provider::{MailcowApi, MailcowConnector};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Read a secret key as UTF-8 text
///
/// A missing secret, a missing key or a non UTF-8 value is a reference error.
pub async fn resolve_secret_string(
    secrets: &dyn SecretResolver,
    namespace: &str,
    key_ref: &SecretKeyRef,
) -> Result<Zeroizing<String>, ReconcilerError> {
    let bytes = secrets
        .resolve(namespace, key_ref)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(msg) | StoreError::Invalid(msg) => {
                ReconcilerError::Reference(msg)
            }
            other => ReconcilerError::Store(other),
        })?;

    let text = std::str::from_utf8(&bytes).map_err(|_| {
        ReconcilerError::Reference(format!("secret {namespace}/{key_ref} is not valid UTF-8"))
    })?;
    Ok(Zeroizing::new(text.trim_end_matches(['\r', '\n']).to_string()))
}

/// Build an API handle from an already loaded connection
pub async fn connect(
    connection: &MailcowConnection,
    namespace: &str,
    secrets: &dyn SecretResolver,
    connector: &dyn MailcowConnector,
) -> Result<Arc<dyn MailcowApi>, ReconcilerError> {
    let api_key = resolve_secret_string(secrets, namespace, &connection.spec.api_key_secret).await?;
    if api_key.is_empty() {
        return Err(ReconcilerError::Reference(format!(
            "secret {namespace}/{} holds an empty API key",
            connection.spec.api_key_secret
        )));
    }
    Ok(connector.connect(&connection.spec.endpoint, api_key)?)
}

/// Load the named connection and build an API handle for it
pub async fn resolve_connection(
    connections: &dyn ObjectStore<MailcowConnection>,
    secrets: &dyn SecretResolver,
    connector: &dyn MailcowConnector,
    namespace: &str,
    connection_ref: &str,
) -> Result<Arc<dyn MailcowApi>, ReconcilerError> {
    let connection = connections
        .load(namespace, connection_ref)
        .await?
        .ok_or_else(|| {
            ReconcilerError::Reference(format!(
                "MailcowConnection {namespace}/{connection_ref} not found"
            ))
        })?;

    debug!(
        "Resolved MailcowConnection {}/{} -> {}",
        namespace, connection_ref, connection.spec.endpoint
    );
    connect(&connection, namespace, secrets, connector).await
}
