//! # Operations
//!
//! Implementation of `MailcowApi` for the REST client.

use super::response::{decode_list, decode_single};
use super::{
    lookup_path, AddAliasRequest, AddDkimRequest, AddDomainAdminRequest, AddDomainRequest,
    AddMailboxRequest, AliasRecord, DkimRecord, DomainAdminRecord, DomainRecord, EditAliasAttr,
    EditDomainAdminAttr, EditDomainAttr, EditMailboxAttr, EditRateLimitAttr, EditRequest,
    MailboxRecord, MailcowClient, MailcowError, VersionRecord,
};
use crate::provider::MailcowApi;
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
impl MailcowApi for MailcowClient {
    async fn get_domain(&self, domain: &str) -> Result<Option<DomainRecord>, MailcowError> {
        let body = self
            .get("get_domain", &lookup_path("/get/domain", domain))
            .await?;
        decode_single(&body)
    }

    async fn add_domain(&self, request: &AddDomainRequest) -> Result<(), MailcowError> {
        debug!("Adding mailcow domain {}", request.domain);
        self.post("add_domain", "/add/domain", request).await?;
        Ok(())
    }

    async fn edit_domain(&self, domain: &str, attr: &EditDomainAttr) -> Result<(), MailcowError> {
        self.post("edit_domain", "/edit/domain", &EditRequest::single(domain, attr))
            .await?;
        Ok(())
    }

    async fn edit_domain_rate_limit(
        &self,
        domain: &str,
        attr: &EditRateLimitAttr,
    ) -> Result<(), MailcowError> {
        self.post(
            "edit_domain_rate_limit",
            "/edit/rl-domain",
            &EditRequest::single(domain, attr),
        )
        .await?;
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<(), MailcowError> {
        self.post("delete_domain", "/delete/domain", &[domain]).await?;
        Ok(())
    }

    async fn get_dkim(&self, domain: &str) -> Result<Option<DkimRecord>, MailcowError> {
        let body = self
            .get("get_dkim", &lookup_path("/get/dkim", domain))
            .await?;
        decode_single(&body)
    }

    async fn add_dkim(&self, request: &AddDkimRequest) -> Result<(), MailcowError> {
        debug!("Generating DKIM key for {}", request.domains);
        self.post("add_dkim", "/add/dkim", request).await?;
        Ok(())
    }

    async fn list_domain_admins(&self) -> Result<Vec<DomainAdminRecord>, MailcowError> {
        let body = self
            .get("list_domain_admins", "/get/domain-admin/all")
            .await?;
        decode_list(&body)
    }

    async fn add_domain_admin(
        &self,
        request: &AddDomainAdminRequest,
    ) -> Result<(), MailcowError> {
        debug!("Adding mailcow domain admin {}", request.username);
        self.post("add_domain_admin", "/add/domain-admin", request)
            .await?;
        Ok(())
    }

    async fn edit_domain_admin(
        &self,
        username: &str,
        attr: &EditDomainAdminAttr,
    ) -> Result<(), MailcowError> {
        self.post(
            "edit_domain_admin",
            "/edit/domain-admin",
            &EditRequest::single(username, attr),
        )
        .await?;
        Ok(())
    }

    async fn delete_domain_admin(&self, username: &str) -> Result<(), MailcowError> {
        self.post("delete_domain_admin", "/delete/domain-admin", &[username])
            .await?;
        Ok(())
    }

    async fn get_mailbox(&self, address: &str) -> Result<Option<MailboxRecord>, MailcowError> {
        let body = self
            .get("get_mailbox", &lookup_path("/get/mailbox", address))
            .await?;
        decode_single(&body)
    }

    async fn add_mailbox(&self, request: &AddMailboxRequest) -> Result<(), MailcowError> {
        debug!(
            "Adding mailcow mailbox {}@{}",
            request.local_part, request.domain
        );
        self.post("add_mailbox", "/add/mailbox", request).await?;
        Ok(())
    }

    async fn edit_mailbox(
        &self,
        address: &str,
        attr: &EditMailboxAttr,
    ) -> Result<(), MailcowError> {
        self.post("edit_mailbox", "/edit/mailbox", &EditRequest::single(address, attr))
            .await?;
        Ok(())
    }

    async fn delete_mailbox(&self, address: &str) -> Result<(), MailcowError> {
        self.post("delete_mailbox", "/delete/mailbox", &[address])
            .await?;
        Ok(())
    }

    async fn get_alias(&self, address: &str) -> Result<Option<AliasRecord>, MailcowError> {
        let body = self
            .get("get_alias", &lookup_path("/get/alias", address))
            .await?;
        decode_single(&body)
    }

    async fn add_alias(&self, request: &AddAliasRequest) -> Result<(), MailcowError> {
        debug!("Adding mailcow alias {}", request.address);
        self.post("add_alias", "/add/alias", request).await?;
        Ok(())
    }

    async fn edit_alias(&self, address: &str, attr: &EditAliasAttr) -> Result<(), MailcowError> {
        self.post("edit_alias", "/edit/alias", &EditRequest::single(address, attr))
            .await?;
        Ok(())
    }

    async fn delete_alias(&self, address: &str) -> Result<(), MailcowError> {
        self.post("delete_alias", "/delete/alias", &[address]).await?;
        Ok(())
    }

    async fn get_version(&self) -> Result<VersionRecord, MailcowError> {
        let body = self.get("get_version", "/get/status/version").await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
