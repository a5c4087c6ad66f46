//! # DomainAdmin
//!
//! mailcow has no single-admin lookup, so existence is decided by scanning the
//! full admin list for the username.

use crate::controller::reconciler::connection::resolve_secret_string;
use crate::controller::reconciler::converters::bool_to_int;
use crate::controller::reconciler::protocol::{MailcowResource, SyncContext};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{DomainAdmin, ResourceStatus};
use crate::provider::mailcow::{AddDomainAdminRequest, DomainAdminRecord, EditDomainAdminAttr};
use async_trait::async_trait;
use kube::ResourceExt;
use std::collections::BTreeSet;

fn domain_set(domains: &[String]) -> BTreeSet<String> {
    domains.iter().map(|d| d.to_ascii_lowercase()).collect()
}

#[async_trait]
impl MailcowResource for DomainAdmin {
    type Remote = DomainAdminRecord;

    const KIND: &'static str = "DomainAdmin";

    fn status(&self) -> Option<&ResourceStatus> {
        self.status.as_ref()
    }

    fn status_mut(&mut self) -> &mut ResourceStatus {
        self.status.get_or_insert_with(ResourceStatus::default)
    }

    fn connection_ref(&self) -> &str {
        &self.spec.connection_ref
    }

    fn identity_key(&self) -> String {
        self.spec.username.clone()
    }

    async fn fetch(
        &self,
        ctx: &SyncContext<'_>,
    ) -> Result<Option<DomainAdminRecord>, ReconcilerError> {
        let admins = ctx.api.list_domain_admins().await?;
        Ok(admins
            .into_iter()
            .find(|admin| admin.username.as_deref() == Some(self.spec.username.as_str())))
    }

    async fn create(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        let namespace = self.namespace().unwrap_or_default();
        let password =
            resolve_secret_string(ctx.secrets, &namespace, &self.spec.password_secret).await?;

        let request = AddDomainAdminRequest {
            username: self.spec.username.clone(),
            password: password.to_string(),
            password2: password.to_string(),
            active: bool_to_int(self.spec.active),
            domains: self.spec.domains.clone(),
        };
        Ok(ctx.api.add_domain_admin(&request).await?)
    }

    fn in_sync(&self, remote: &DomainAdminRecord) -> bool {
        remote.active == Some(self.spec.active)
            && domain_set(&remote.selected_domains) == domain_set(&self.spec.domains)
    }

    async fn update(
        &self,
        ctx: &SyncContext<'_>,
        _remote: &DomainAdminRecord,
    ) -> Result<(), ReconcilerError> {
        let attr = EditDomainAdminAttr {
            active: self.spec.active,
            domains: self.spec.domains.clone(),
        };
        Ok(ctx
            .api
            .edit_domain_admin(&self.spec.username, &attr)
            .await?)
    }

    async fn delete(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        Ok(ctx.api.delete_domain_admin(&self.spec.username).await?)
    }
}
