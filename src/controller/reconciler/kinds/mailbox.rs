//! # Mailbox
//!
//! Display name, password and `forcePasswordChange` are only sent on creation;
//! afterwards they belong to the mailbox owner.

use crate::controller::reconciler::connection::resolve_secret_string;
use crate::controller::reconciler::converters::{int64_to_float32, mib_to_bytes};
use crate::controller::reconciler::protocol::{MailcowResource, SyncContext};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{Mailbox, ResourceStatus};
use crate::provider::mailcow::{AddMailboxRequest, EditMailboxAttr, MailboxRecord};
use async_trait::async_trait;
use kube::ResourceExt;

#[async_trait]
impl MailcowResource for Mailbox {
    type Remote = MailboxRecord;

    const KIND: &'static str = "Mailbox";

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
        self.spec.address()
    }

    async fn fetch(&self, ctx: &SyncContext<'_>) -> Result<Option<MailboxRecord>, ReconcilerError> {
        Ok(ctx.api.get_mailbox(&self.spec.address()).await?)
    }

    async fn create(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        let namespace = self.namespace().unwrap_or_default();
        let password =
            resolve_secret_string(ctx.secrets, &namespace, &self.spec.password_secret).await?;

        let request = AddMailboxRequest {
            domain: self.spec.domain.clone(),
            local_part: self.spec.local_part.clone(),
            name: self.spec.name.clone(),
            password: password.to_string(),
            password2: password.to_string(),
            active: self.spec.active,
            force_pw_update: self.spec.force_password_change,
            quota: self.spec.quota.map(int64_to_float32),
        };
        Ok(ctx.api.add_mailbox(&request).await?)
    }

    fn in_sync(&self, remote: &MailboxRecord) -> bool {
        remote.active == Some(self.spec.active)
            && self
                .spec
                .quota
                .is_none_or(|quota| remote.quota == Some(mib_to_bytes(quota)))
    }

    async fn update(
        &self,
        ctx: &SyncContext<'_>,
        _remote: &MailboxRecord,
    ) -> Result<(), ReconcilerError> {
        let attr = EditMailboxAttr {
            active: self.spec.active,
            quota: self.spec.quota.map(int64_to_float32),
        };
        Ok(ctx.api.edit_mailbox(&self.spec.address(), &attr).await?)
    }

    async fn delete(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        Ok(ctx.api.delete_mailbox(&self.spec.address()).await?)
    }
}
