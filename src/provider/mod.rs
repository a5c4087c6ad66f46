//! # Provider Modules
//!
//! The mailcow backend as seen by the reconcilers.
//!
//! - `MailcowApi` is the full set of remote operations a reconciler may issue
//! - `MailcowConnector` builds an authenticated `MailcowApi` from an endpoint
//!   and an API key
//!
//! The reqwest implementation lives in `mailcow`. Tests substitute in-memory
//! implementations of both traits.

pub mod mailcow;

use async_trait::async_trait;
use mailcow::{
    AddAliasRequest, AddDkimRequest, AddDomainAdminRequest, AddDomainRequest, AddMailboxRequest,
    AliasRecord, DkimRecord, DomainAdminRecord, DomainRecord, EditAliasAttr, EditDomainAdminAttr,
    EditDomainAttr, EditMailboxAttr, EditRateLimitAttr, MailboxRecord, MailcowClient,
    MailcowError, VersionRecord,
};
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

/// Remote operations of a mailcow instance
///
/// Lookups return `Ok(None)` when the backend reports no matching object.
#[async_trait]
pub trait MailcowApi: Send + Sync + std::fmt::Debug {
    async fn get_domain(&self, domain: &str) -> Result<Option<DomainRecord>, MailcowError>;
    async fn add_domain(&self, request: &AddDomainRequest) -> Result<(), MailcowError>;
    async fn edit_domain(&self, domain: &str, attr: &EditDomainAttr) -> Result<(), MailcowError>;
    /// The primary domain edit ignores rate limits; they have their own endpoint
    async fn edit_domain_rate_limit(
        &self,
        domain: &str,
        attr: &EditRateLimitAttr,
    ) -> Result<(), MailcowError>;
    async fn delete_domain(&self, domain: &str) -> Result<(), MailcowError>;

    async fn get_dkim(&self, domain: &str) -> Result<Option<DkimRecord>, MailcowError>;
    async fn add_dkim(&self, request: &AddDkimRequest) -> Result<(), MailcowError>;

    /// There is no single-admin lookup, only the full list
    async fn list_domain_admins(&self) -> Result<Vec<DomainAdminRecord>, MailcowError>;
    async fn add_domain_admin(&self, request: &AddDomainAdminRequest)
        -> Result<(), MailcowError>;
    async fn edit_domain_admin(
        &self,
        username: &str,
        attr: &EditDomainAdminAttr,
    ) -> Result<(), MailcowError>;
    async fn delete_domain_admin(&self, username: &str) -> Result<(), MailcowError>;

    async fn get_mailbox(&self, address: &str) -> Result<Option<MailboxRecord>, MailcowError>;
    async fn add_mailbox(&self, request: &AddMailboxRequest) -> Result<(), MailcowError>;
    async fn edit_mailbox(&self, address: &str, attr: &EditMailboxAttr)
        -> Result<(), MailcowError>;
    async fn delete_mailbox(&self, address: &str) -> Result<(), MailcowError>;

    async fn get_alias(&self, address: &str) -> Result<Option<AliasRecord>, MailcowError>;
    async fn add_alias(&self, request: &AddAliasRequest) -> Result<(), MailcowError>;
    async fn edit_alias(&self, address: &str, attr: &EditAliasAttr) -> Result<(), MailcowError>;
    async fn delete_alias(&self, address: &str) -> Result<(), MailcowError>;

    /// Cheap authenticated call used to verify a connection
    async fn get_version(&self) -> Result<VersionRecord, MailcowError>;
}

/// Builds API handles for a resolved connection
pub trait MailcowConnector: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns an error if the client cannot be constructed
    fn connect(
        &self,
        endpoint: &str,
        api_key: Zeroizing<String>,
    ) -> Result<Arc<dyn MailcowApi>, MailcowError>;
}

/// Connector producing reqwest-backed [`MailcowClient`]s
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl MailcowConnector for HttpConnector {
    fn connect(
        &self,
        endpoint: &str,
        api_key: Zeroizing<String>,
    ) -> Result<Arc<dyn MailcowApi>, MailcowError> {
        Ok(Arc::new(MailcowClient::new(endpoint, api_key, self.timeout)?))
    }
}
