//! In-memory collaborators for driving whole reconciliation passes in tests.

use crate::config::ControllerConfig;
use crate::controller::reconciler::converters::mib_to_bytes;
use crate::controller::reconciler::protocol::{reconcile, MailcowResource};
use crate::controller::reconciler::store::{ConfigMapStore, ObjectStore, SecretResolver, StoreError};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::{
    Alias, AliasSpec, Domain, DomainAdmin, DomainAdminSpec, DomainSpec, Mailbox, MailboxSpec,
    MailcowConnection, MailcowConnectionSpec, RateLimitFrame, SecretKeyRef,
};
use crate::provider::mailcow::{
    AddAliasRequest, AddDkimRequest, AddDomainAdminRequest, AddDomainRequest, AddMailboxRequest,
    AliasRecord, DkimRecord, DomainAdminRecord, DomainRecord, EditAliasAttr, EditDomainAdminAttr,
    EditDomainAttr, EditMailboxAttr, EditRateLimitAttr, MailboxRecord, MailcowError,
    RateLimitRecord, VersionRecord,
};
use crate::provider::{MailcowApi, MailcowConnector};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::Resource;
use kube_runtime::controller::Action;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroize::Zeroizing;

pub const NAMESPACE: &str = "mail";
pub const CONNECTION: &str = "mailcow";

fn with_meta<K: Resource>(mut object: K, namespace: &str) -> K {
    let meta = object.meta_mut();
    meta.namespace = Some(namespace.to_string());
    meta.generation = Some(1);
    meta.uid = Some(format!("uid-{}", meta.name.clone().unwrap_or_default()));
    object
}

pub fn connection(namespace: &str, name: &str) -> MailcowConnection {
    with_meta(
        MailcowConnection::new(
            name,
            MailcowConnectionSpec {
                endpoint: "https://mail.example.com".to_string(),
                api_key_secret: SecretKeyRef {
                    name: "mailcow-api".to_string(),
                    key: "api-key".to_string(),
                },
            },
        ),
        namespace,
    )
}

pub fn domain_spec() -> DomainSpec {
    DomainSpec {
        connection_ref: CONNECTION.to_string(),
        domain: "example.com".to_string(),
        description: "Example".to_string(),
        quota: 1024,
        max_quota: 512,
        default_quota: 256,
        max_mailboxes: 10,
        rate_limit: Some(100),
        rate_limit_frame: RateLimitFrame::Hour,
        active: true,
    }
}

pub fn domain(namespace: &str, name: &str) -> Domain {
    with_meta(Domain::new(name, domain_spec()), namespace)
}

/// What mailcow reports for a domain created from `spec`
pub fn domain_record(spec: &DomainSpec) -> DomainRecord {
    DomainRecord {
        domain_name: Some(spec.domain.clone()),
        description: Some(spec.description.clone()),
        max_quota_for_domain: Some(mib_to_bytes(spec.quota)),
        max_quota_for_mbox: Some(mib_to_bytes(spec.max_quota)),
        def_quota_for_mbox: Some(mib_to_bytes(spec.default_quota)),
        max_num_mboxes_for_domain: Some(spec.max_mailboxes),
        active: Some(spec.active),
        rl: spec.rate_limit.map(|value| RateLimitRecord {
            value: Some(value),
            frame: Some(spec.rate_limit_frame.as_str().to_string()),
        }),
    }
}

pub fn mailbox(namespace: &str, local_part: &str) -> Mailbox {
    with_meta(
        Mailbox::new(
            &format!("{local_part}-example-com"),
            MailboxSpec {
                connection_ref: CONNECTION.to_string(),
                domain: "example.com".to_string(),
                local_part: local_part.to_string(),
                name: "Example User".to_string(),
                password_secret: SecretKeyRef {
                    name: "user-password".to_string(),
                    key: "password".to_string(),
                },
                active: true,
                force_password_change: false,
                quota: Some(1024),
            },
        ),
        namespace,
    )
}

pub fn domain_admin(namespace: &str, username: &str, domains: &[&str]) -> DomainAdmin {
    with_meta(
        DomainAdmin::new(
            username,
            DomainAdminSpec {
                connection_ref: CONNECTION.to_string(),
                username: username.to_string(),
                password_secret: SecretKeyRef {
                    name: "admin-password".to_string(),
                    key: "password".to_string(),
                },
                active: true,
                domains: domains.iter().map(|d| (*d).to_string()).collect(),
            },
        ),
        namespace,
    )
}

pub fn alias(namespace: &str, name: &str) -> Alias {
    with_meta(
        Alias::new(
            name,
            AliasSpec {
                connection_ref: CONNECTION.to_string(),
                address: "info@example.com".to_string(),
                goto: "user@example.com".to_string(),
                active: true,
            },
        ),
        namespace,
    )
}

/// Object store with API-server semantics for `resourceVersion` and finalizers
#[derive(Debug)]
pub struct MemoryStore<K> {
    objects: Mutex<HashMap<(String, String), K>>,
    meta_writes: Mutex<usize>,
    status_writes: Mutex<usize>,
    next_version: Mutex<u64>,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            meta_writes: Mutex::new(0),
            status_writes: Mutex::new(0),
            next_version: Mutex::new(1),
        }
    }
}

fn key_of<K: Resource>(object: &K) -> (String, String) {
    (
        object.meta().namespace.clone().unwrap_or_default(),
        object.meta().name.clone().unwrap_or_default(),
    )
}

impl<K: Resource + Clone> MemoryStore<K> {
    fn bump(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }

    pub fn insert(&self, mut object: K) {
        object.meta_mut().resource_version = Some(self.bump());
        self.objects.lock().unwrap().insert(key_of(&object), object);
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Flag the object for deletion the way the API server does when it carries finalizers
    pub fn mark_deleted(&self, namespace: &str, name: &str) {
        let mut objects = self.objects.lock().unwrap();
        if let Some(object) = objects.get_mut(&(namespace.to_string(), name.to_string())) {
            object.meta_mut().deletion_timestamp = Some(Time(chrono::Utc::now()));
        }
    }

    pub fn meta_writes(&self) -> usize {
        *self.meta_writes.lock().unwrap()
    }

    pub fn status_writes(&self) -> usize {
        *self.status_writes.lock().unwrap()
    }

    fn current(&self, object: &K) -> Result<K, StoreError> {
        let key = key_of(object);
        let objects = self.objects.lock().unwrap();
        let stored = objects
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", key.0, key.1)))?;
        if stored.meta().resource_version != object.meta().resource_version {
            return Err(StoreError::Conflict(format!("{}/{} was modified", key.0, key.1)));
        }
        Ok(stored.clone())
    }
}

#[async_trait]
impl<K> ObjectStore<K> for MemoryStore<K>
where
    K: Resource + Clone + Send + Sync,
{
    async fn load(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.get(namespace, name))
    }

    async fn persist_meta(&self, object: &K) -> Result<(), StoreError> {
        let mut stored = self.current(object)?;
        *self.meta_writes.lock().unwrap() += 1;

        stored.meta_mut().finalizers = object.meta().finalizers.clone();
        let released = stored.meta().deletion_timestamp.is_some()
            && stored.meta().finalizers.as_ref().is_none_or(Vec::is_empty);
        if released {
            self.objects.lock().unwrap().remove(&key_of(object));
        } else {
            stored.meta_mut().resource_version = Some(self.bump());
            self.objects.lock().unwrap().insert(key_of(object), stored);
        }
        Ok(())
    }

    async fn persist_status(&self, object: &K) -> Result<(), StoreError> {
        let stored = self.current(object)?;
        *self.status_writes.lock().unwrap() += 1;

        let mut next = object.clone();
        *next.meta_mut() = stored.meta().clone();
        next.meta_mut().resource_version = Some(self.bump());
        self.objects.lock().unwrap().insert(key_of(object), next);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeSecrets {
    values: Mutex<HashMap<(String, String, String), Vec<u8>>>,
}

impl FakeSecrets {
    pub fn insert(&self, namespace: &str, name: &str, key: &str, value: &[u8]) {
        self.values.lock().unwrap().insert(
            (namespace.to_string(), name.to_string(), key.to_string()),
            value.to_vec(),
        );
    }
}

#[async_trait]
impl SecretResolver for FakeSecrets {
    async fn resolve(
        &self,
        namespace: &str,
        key_ref: &SecretKeyRef,
    ) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        self.values
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), key_ref.name.clone(), key_ref.key.clone()))
            .cloned()
            .map(Zeroizing::new)
            .ok_or_else(|| StoreError::NotFound(format!("secret {namespace}/{key_ref}")))
    }
}

#[derive(Debug, Default)]
pub struct FakeConfigMaps {
    maps: Mutex<HashMap<(String, String), ConfigMap>>,
    writes: Mutex<usize>,
}

impl FakeConfigMaps {
    pub fn get_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.maps
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn store(&self, namespace: &str, config_map: &ConfigMap) {
        *self.writes.lock().unwrap() += 1;
        self.maps.lock().unwrap().insert(
            (
                namespace.to_string(),
                config_map.metadata.name.clone().unwrap_or_default(),
            ),
            config_map.clone(),
        );
    }
}

#[async_trait]
impl ConfigMapStore for FakeConfigMaps {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>, StoreError> {
        Ok(self.get_map(namespace, name))
    }

    async fn create(&self, namespace: &str, config_map: &ConfigMap) -> Result<(), StoreError> {
        self.store(namespace, config_map);
        Ok(())
    }

    async fn replace(&self, namespace: &str, config_map: &ConfigMap) -> Result<(), StoreError> {
        self.store(namespace, config_map);
        Ok(())
    }
}

/// Mutating calls seen by [`FakeMailcow`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddDomain(AddDomainRequest),
    EditDomain(String, EditDomainAttr),
    EditDomainRateLimit(String, EditRateLimitAttr),
    DeleteDomain(Vec<String>),
    AddDkim(AddDkimRequest),
    AddDomainAdmin(String),
    EditDomainAdmin(String, EditDomainAdminAttr),
    DeleteDomainAdmin(Vec<String>),
    AddMailbox(String),
    EditMailbox(String, EditMailboxAttr),
    DeleteMailbox(Vec<String>),
    AddAlias(AddAliasRequest),
    EditAlias(String, EditAliasAttr),
    DeleteAlias(Vec<String>),
}

#[derive(Debug, Default)]
struct Backend {
    domains: HashMap<String, DomainRecord>,
    dkim: HashMap<String, DkimRecord>,
    generated_dkim: Option<DkimRecord>,
    admins: Vec<DomainAdminRecord>,
    mailboxes: HashMap<String, MailboxRecord>,
    aliases: HashMap<String, AliasRecord>,
    version: Option<String>,
    calls: Vec<Call>,
    gets: Vec<String>,
    passwords: Vec<String>,
    fail_next: VecDeque<MailcowError>,
    fail_on: HashMap<&'static str, MailcowError>,
}

/// mailcow stand-in that behaves like the real backend for the calls it records
#[derive(Debug, Default)]
pub struct FakeMailcow {
    backend: Mutex<Backend>,
}

impl FakeMailcow {
    pub fn calls(&self) -> Vec<Call> {
        self.backend.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        let mut backend = self.backend.lock().unwrap();
        backend.calls.clear();
        backend.gets.clear();
    }

    /// Lookups issued, as `operation:id`
    pub fn gets(&self) -> Vec<String> {
        self.backend.lock().unwrap().gets.clone()
    }

    /// Passwords sent on creation
    pub fn passwords(&self) -> Vec<String> {
        self.backend.lock().unwrap().passwords.clone()
    }

    pub fn set_version(&self, version: &str) {
        self.backend.lock().unwrap().version = Some(version.to_string());
    }

    pub fn put_domain(&self, record: DomainRecord) {
        let id = record.domain_name.clone().unwrap_or_default();
        self.backend.lock().unwrap().domains.insert(id, record);
    }

    pub fn domain(&self, id: &str) -> Option<DomainRecord> {
        self.backend.lock().unwrap().domains.get(id).cloned()
    }

    /// What `add_dkim` stores instead of a complete key
    pub fn generate_dkim_as(&self, record: DkimRecord) {
        self.backend.lock().unwrap().generated_dkim = Some(record);
    }

    pub fn put_mailbox(&self, record: MailboxRecord) {
        let id = record.username.clone().unwrap_or_default();
        self.backend.lock().unwrap().mailboxes.insert(id, record);
    }

    pub fn put_alias(&self, record: AliasRecord) {
        let id = record.address.clone().unwrap_or_default();
        self.backend.lock().unwrap().aliases.insert(id, record);
    }

    pub fn put_admin(&self, record: DomainAdminRecord) {
        self.backend.lock().unwrap().admins.push(record);
    }

    /// Fail whatever call comes next
    pub fn fail_next(&self, error: MailcowError) {
        self.backend.lock().unwrap().fail_next.push_back(error);
    }

    /// Fail the next call of one operation
    pub fn fail_on(&self, operation: &'static str, error: MailcowError) {
        self.backend.lock().unwrap().fail_on.insert(operation, error);
    }

    fn enter(
        &self,
        operation: &'static str,
    ) -> Result<std::sync::MutexGuard<'_, Backend>, MailcowError> {
        let mut backend = self.backend.lock().unwrap();
        if let Some(error) = backend.fail_next.pop_front() {
            return Err(error);
        }
        if let Some(error) = backend.fail_on.remove(operation) {
            return Err(error);
        }
        Ok(backend)
    }
}

#[async_trait]
impl MailcowApi for FakeMailcow {
    async fn get_domain(&self, domain: &str) -> Result<Option<DomainRecord>, MailcowError> {
        let mut backend = self.enter("get_domain")?;
        backend.gets.push(format!("get_domain:{domain}"));
        Ok(backend.domains.get(domain).cloned())
    }

    async fn add_domain(&self, request: &AddDomainRequest) -> Result<(), MailcowError> {
        let mut backend = self.enter("add_domain")?;
        backend.calls.push(Call::AddDomain(request.clone()));
        let record = DomainRecord {
            domain_name: Some(request.domain.clone()),
            description: Some(request.description.clone()),
            max_quota_for_domain: Some(mib_to_bytes(request.quota as i64)),
            max_quota_for_mbox: Some(mib_to_bytes(request.maxquota as i64)),
            def_quota_for_mbox: Some(mib_to_bytes(request.defquota as i64)),
            max_num_mboxes_for_domain: Some(request.mailboxes as i64),
            active: Some(request.active),
            rl: request.rl_value.map(|value| RateLimitRecord {
                value: Some(value),
                frame: Some(request.rl_frame.clone()),
            }),
        };
        backend.domains.insert(request.domain.clone(), record);
        Ok(())
    }

    async fn edit_domain(&self, domain: &str, attr: &EditDomainAttr) -> Result<(), MailcowError> {
        let mut backend = self.enter("edit_domain")?;
        backend.calls.push(Call::EditDomain(domain.to_string(), attr.clone()));
        if let Some(record) = backend.domains.get_mut(domain) {
            record.description = Some(attr.description.clone());
            record.max_quota_for_domain = Some(mib_to_bytes(attr.quota as i64));
            record.max_quota_for_mbox = Some(mib_to_bytes(attr.maxquota as i64));
            record.def_quota_for_mbox = Some(mib_to_bytes(attr.defquota as i64));
            record.max_num_mboxes_for_domain = Some(attr.mailboxes as i64);
            record.active = Some(attr.active);
        }
        Ok(())
    }

    async fn edit_domain_rate_limit(
        &self,
        domain: &str,
        attr: &EditRateLimitAttr,
    ) -> Result<(), MailcowError> {
        let mut backend = self.enter("edit_domain_rate_limit")?;
        backend
            .calls
            .push(Call::EditDomainRateLimit(domain.to_string(), attr.clone()));
        if let Some(record) = backend.domains.get_mut(domain) {
            record.rl = attr.rl_value.map(|value| RateLimitRecord {
                value: Some(value),
                frame: Some(attr.rl_frame.clone()),
            });
        }
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<(), MailcowError> {
        let mut backend = self.enter("delete_domain")?;
        backend.calls.push(Call::DeleteDomain(vec![domain.to_string()]));
        backend.domains.remove(domain);
        Ok(())
    }

    async fn get_dkim(&self, domain: &str) -> Result<Option<DkimRecord>, MailcowError> {
        let mut backend = self.enter("get_dkim")?;
        backend.gets.push(format!("get_dkim:{domain}"));
        Ok(backend.dkim.get(domain).cloned())
    }

    async fn add_dkim(&self, request: &AddDkimRequest) -> Result<(), MailcowError> {
        let mut backend = self.enter("add_dkim")?;
        backend.calls.push(Call::AddDkim(request.clone()));
        let record = backend.generated_dkim.clone().unwrap_or_else(|| DkimRecord {
            dkim_selector: Some(request.dkim_selector.clone()),
            dkim_txt: Some("v=DKIM1;k=rsa;t=s;s=email;p=MIIBIjAN".to_string()),
            length: Some(format!("{}", request.key_size as i64)),
            pubkey: Some("MIIBIjAN".to_string()),
        });
        backend.dkim.insert(request.domains.clone(), record);
        Ok(())
    }

    async fn list_domain_admins(&self) -> Result<Vec<DomainAdminRecord>, MailcowError> {
        let mut backend = self.enter("list_domain_admins")?;
        backend.gets.push("list_domain_admins".to_string());
        Ok(backend.admins.clone())
    }

    async fn add_domain_admin(&self, request: &AddDomainAdminRequest) -> Result<(), MailcowError> {
        let mut backend = self.enter("add_domain_admin")?;
        backend
            .calls
            .push(Call::AddDomainAdmin(request.username.clone()));
        backend.passwords.push(request.password.clone());
        backend.admins.push(DomainAdminRecord {
            username: Some(request.username.clone()),
            active: Some(request.active == 1),
            selected_domains: request.domains.clone(),
        });
        Ok(())
    }

    async fn edit_domain_admin(
        &self,
        username: &str,
        attr: &EditDomainAdminAttr,
    ) -> Result<(), MailcowError> {
        let mut backend = self.enter("edit_domain_admin")?;
        backend
            .calls
            .push(Call::EditDomainAdmin(username.to_string(), attr.clone()));
        if let Some(admin) = backend
            .admins
            .iter_mut()
            .find(|a| a.username.as_deref() == Some(username))
        {
            admin.active = Some(attr.active);
            admin.selected_domains = attr.domains.clone();
        }
        Ok(())
    }

    async fn delete_domain_admin(&self, username: &str) -> Result<(), MailcowError> {
        let mut backend = self.enter("delete_domain_admin")?;
        backend
            .calls
            .push(Call::DeleteDomainAdmin(vec![username.to_string()]));
        backend
            .admins
            .retain(|a| a.username.as_deref() != Some(username));
        Ok(())
    }

    async fn get_mailbox(&self, address: &str) -> Result<Option<MailboxRecord>, MailcowError> {
        let mut backend = self.enter("get_mailbox")?;
        backend.gets.push(format!("get_mailbox:{address}"));
        Ok(backend.mailboxes.get(address).cloned())
    }

    async fn add_mailbox(&self, request: &AddMailboxRequest) -> Result<(), MailcowError> {
        let mut backend = self.enter("add_mailbox")?;
        let address = format!("{}@{}", request.local_part, request.domain);
        backend.calls.push(Call::AddMailbox(address.clone()));
        backend.passwords.push(request.password.clone());
        backend.mailboxes.insert(
            address.clone(),
            MailboxRecord {
                username: Some(address),
                active: Some(request.active),
                quota: Some(request.quota.map_or(0, |q| mib_to_bytes(q as i64))),
            },
        );
        Ok(())
    }

    async fn edit_mailbox(
        &self,
        address: &str,
        attr: &EditMailboxAttr,
    ) -> Result<(), MailcowError> {
        let mut backend = self.enter("edit_mailbox")?;
        backend
            .calls
            .push(Call::EditMailbox(address.to_string(), attr.clone()));
        if let Some(record) = backend.mailboxes.get_mut(address) {
            record.active = Some(attr.active);
            if let Some(quota) = attr.quota {
                record.quota = Some(mib_to_bytes(quota as i64));
            }
        }
        Ok(())
    }

    async fn delete_mailbox(&self, address: &str) -> Result<(), MailcowError> {
        let mut backend = self.enter("delete_mailbox")?;
        backend
            .calls
            .push(Call::DeleteMailbox(vec![address.to_string()]));
        backend.mailboxes.remove(address);
        Ok(())
    }

    async fn get_alias(&self, address: &str) -> Result<Option<AliasRecord>, MailcowError> {
        let mut backend = self.enter("get_alias")?;
        backend.gets.push(format!("get_alias:{address}"));
        Ok(backend.aliases.get(address).cloned())
    }

    async fn add_alias(&self, request: &AddAliasRequest) -> Result<(), MailcowError> {
        let mut backend = self.enter("add_alias")?;
        backend.calls.push(Call::AddAlias(request.clone()));
        backend.aliases.insert(
            request.address.clone(),
            AliasRecord {
                address: Some(request.address.clone()),
                goto: Some(request.goto.clone()),
                active: Some(request.active),
            },
        );
        Ok(())
    }

    async fn edit_alias(&self, address: &str, attr: &EditAliasAttr) -> Result<(), MailcowError> {
        let mut backend = self.enter("edit_alias")?;
        backend
            .calls
            .push(Call::EditAlias(address.to_string(), attr.clone()));
        if let Some(record) = backend.aliases.get_mut(address) {
            record.goto = Some(attr.goto.clone());
            record.active = Some(attr.active);
        }
        Ok(())
    }

    async fn delete_alias(&self, address: &str) -> Result<(), MailcowError> {
        let mut backend = self.enter("delete_alias")?;
        backend
            .calls
            .push(Call::DeleteAlias(vec![address.to_string()]));
        backend.aliases.remove(address);
        Ok(())
    }

    async fn get_version(&self) -> Result<VersionRecord, MailcowError> {
        let backend = self.enter("get_version")?;
        Ok(VersionRecord {
            version: backend.version.clone(),
        })
    }
}

/// Hands out the shared [`FakeMailcow`] and records what it was asked for
#[derive(Debug, Default)]
pub struct FakeConnector {
    api: Arc<FakeMailcow>,
    connected: Mutex<Vec<(String, String)>>,
}

impl FakeConnector {
    pub fn with_api(api: Arc<FakeMailcow>) -> Self {
        Self {
            api,
            connected: Mutex::new(Vec::new()),
        }
    }

    /// `(endpoint, api key)` of every connection made
    pub fn connected(&self) -> Vec<(String, String)> {
        self.connected.lock().unwrap().clone()
    }
}

impl MailcowConnector for FakeConnector {
    fn connect(
        &self,
        endpoint: &str,
        api_key: Zeroizing<String>,
    ) -> Result<Arc<dyn MailcowApi>, MailcowError> {
        self.connected
            .lock()
            .unwrap()
            .push((endpoint.to_string(), api_key.to_string()));
        Ok(self.api.clone())
    }
}

/// Wires fakes into a [`Reconciler`] for kind `K`
pub struct Harness<K> {
    pub objects: Arc<MemoryStore<K>>,
    pub connections: Arc<MemoryStore<MailcowConnection>>,
    pub secrets: Arc<FakeSecrets>,
    pub config_maps: Arc<FakeConfigMaps>,
    pub api: Arc<FakeMailcow>,
    pub connector: Arc<FakeConnector>,
}

impl<K> Harness<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let api = Arc::new(FakeMailcow::default());
        Self {
            objects: Arc::new(MemoryStore::default()),
            connections: Arc::new(MemoryStore::default()),
            secrets: Arc::new(FakeSecrets::default()),
            config_maps: Arc::new(FakeConfigMaps::default()),
            connector: Arc::new(FakeConnector::with_api(api.clone())),
            api,
        }
    }

    /// Harness with a usable connection in [`NAMESPACE`]
    pub fn connected() -> Self {
        let harness = Self::new();
        harness.connections.insert(connection(NAMESPACE, CONNECTION));
        harness
            .secrets
            .insert(NAMESPACE, "mailcow-api", "api-key", b"api-key-value");
        harness
    }

    pub fn context(&self) -> Arc<Reconciler<K>> {
        Arc::new(Reconciler::new(
            self.objects.clone(),
            self.connections.clone(),
            self.secrets.clone(),
            self.config_maps.clone(),
            self.connector.clone(),
            Arc::new(ControllerConfig::default()),
        ))
    }

    pub fn connection_context(&self) -> Arc<Reconciler<MailcowConnection>> {
        Arc::new(Reconciler::new(
            self.connections.clone(),
            self.connections.clone(),
            self.secrets.clone(),
            self.config_maps.clone(),
            self.connector.clone(),
            Arc::new(ControllerConfig::default()),
        ))
    }
}

impl<K> Harness<K>
where
    K: MailcowResource,
{
    /// Run single passes until one does not ask for an immediate re-run
    pub async fn settle(
        &self,
        template: &K,
    ) -> Result<Action, ReconcilerError> {
        let ctx = self.context();
        for _ in 0..10 {
            let action = reconcile(Arc::new(template.clone()), ctx.clone()).await?;
            if action != Action::requeue(Duration::ZERO) {
                return Ok(action);
            }
        }
        panic!("reconciliation did not settle");
    }
}
