//! # Stores
//!
//! Cluster-side collaborators of a reconciliation pass.
//!
//! - `ObjectStore<K>`: loads custom resources and persists their finalizers and status
//! - `SecretResolver`: reads a single key of a Secret
//! - `ConfigMapStore`: reads and writes the ConfigMaps derived from custom resources
//!
//! Persists use merge patches that carry `metadata.resourceVersion`, so a write
//! based on a stale read fails with [`StoreError::Conflict`].

use crate::constants::FIELD_MANAGER;
use crate::crd::SecretKeyRef;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

/// Failure of a cluster read or write
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write was based on a stale `resourceVersion`
    #[error("conflict: {0}")]
    Conflict(String),
    /// The object (or the key inside it) does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// The object exists but cannot be used
    #[error("invalid: {0}")]
    Invalid(String),
    #[error("kubernetes api error: {0}")]
    Api(kube::Error),
    #[error("failed to serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<kube::Error> for StoreError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(api_err) if api_err.code == 409 => Self::Conflict(api_err.message),
            kube::Error::Api(api_err) if api_err.code == 404 => Self::NotFound(api_err.message),
            other => Self::Api(other),
        }
    }
}

/// Access to custom resources of one kind
#[async_trait]
pub trait ObjectStore<K>: Send + Sync {
    /// Load the current state of an object; `None` once it is gone
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>;

    /// Persist `metadata.finalizers`
    async fn persist_meta(&self, object: &K) -> Result<(), StoreError>;

    /// Persist the status subresource
    async fn persist_status(&self, object: &K) -> Result<(), StoreError>;
}

/// Reads Secret keys referenced by custom resources
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Raw bytes stored under `key_ref.key`
    async fn resolve(
        &self,
        namespace: &str,
        key_ref: &SecretKeyRef,
    ) -> Result<Zeroizing<Vec<u8>>, StoreError>;
}

/// ConfigMaps written on behalf of custom resources
#[async_trait]
pub trait ConfigMapStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>, StoreError>;
    async fn create(&self, namespace: &str, config_map: &ConfigMap) -> Result<(), StoreError>;
    /// Replace the whole object; `metadata.resourceVersion` must be the one that was read
    async fn replace(&self, namespace: &str, config_map: &ConfigMap) -> Result<(), StoreError>;
}

fn patch_params() -> PatchParams {
    PatchParams::apply(FIELD_MANAGER)
}

fn post_params() -> PostParams {
    PostParams {
        dry_run: false,
        field_manager: Some(FIELD_MANAGER.to_string()),
    }
}

/// [`ObjectStore`] backed by the Kubernetes API
pub struct KubeObjectStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeObjectStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K> KubeObjectStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn namespace_and_name<K: Resource>(object: &K) -> Result<(String, String), StoreError> {
    let meta = object.meta();
    match (meta.namespace.clone(), meta.name.clone()) {
        (Some(namespace), Some(name)) => Ok((namespace, name)),
        _ => Err(StoreError::Invalid(
            "object has no namespace or name".to_string(),
        )),
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeObjectStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static,
{
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn persist_meta(&self, object: &K) -> Result<(), StoreError> {
        let (namespace, name) = namespace_and_name(object)?;
        let meta = object.meta();
        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": meta.resource_version,
                "finalizers": meta.finalizers.clone().unwrap_or_default(),
            }
        });

        debug!("Persisting finalizers of {}/{}", namespace, name);
        self.api(&namespace)
            .patch(&name, &patch_params(), &Patch::Merge(patch))
            .await?;
        Ok(())
    }

    async fn persist_status(&self, object: &K) -> Result<(), StoreError> {
        let (namespace, name) = namespace_and_name(object)?;
        let status = serde_json::to_value(object)?
            .get("status")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": object.meta().resource_version,
            },
            "status": status,
        });

        debug!("Persisting status of {}/{}", namespace, name);
        self.api(&namespace)
            .patch_status(&name, &patch_params(), &Patch::Merge(patch))
            .await?;
        Ok(())
    }
}

/// [`SecretResolver`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretResolver {
    client: Client,
}

impl KubeSecretResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretResolver for KubeSecretResolver {
    async fn resolve(
        &self,
        namespace: &str,
        key_ref: &SecretKeyRef,
    ) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api
            .get_opt(&key_ref.name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("secret {namespace}/{}", key_ref.name)))?;

        secret
            .data
            .and_then(|mut data| data.remove(&key_ref.key))
            .map(|value| Zeroizing::new(value.0))
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "key {} in secret {namespace}/{}",
                    key_ref.key, key_ref.name
                ))
            })
    }
}

/// [`ConfigMapStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeConfigMapStore {
    client: Client,
}

impl KubeConfigMapStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ConfigMapStore for KubeConfigMapStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>, StoreError> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn create(&self, namespace: &str, config_map: &ConfigMap) -> Result<(), StoreError> {
        self.api(namespace).create(&post_params(), config_map).await?;
        Ok(())
    }

    async fn replace(&self, namespace: &str, config_map: &ConfigMap) -> Result<(), StoreError> {
        let name = config_map
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| StoreError::Invalid("config map has no name".to_string()))?;
        self.api(namespace)
            .replace(name, &post_params(), config_map)
            .await?;
        Ok(())
    }
}
