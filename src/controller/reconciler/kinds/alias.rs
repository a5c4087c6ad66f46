//! # Alias

use crate::controller::reconciler::protocol::{MailcowResource, SyncContext};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{Alias, ResourceStatus};
use crate::provider::mailcow::{AddAliasRequest, AliasRecord, EditAliasAttr};
use async_trait::async_trait;

/// Destinations compared as a set, ignoring spacing and order
fn same_destinations(a: &str, b: &str) -> bool {
    let split = |s: &str| {
        s.split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<std::collections::BTreeSet<_>>()
    };
    split(a) == split(b)
}

#[async_trait]
impl MailcowResource for Alias {
    type Remote = AliasRecord;

    const KIND: &'static str = "Alias";

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
        self.spec.address.clone()
    }

    async fn fetch(&self, ctx: &SyncContext<'_>) -> Result<Option<AliasRecord>, ReconcilerError> {
        Ok(ctx.api.get_alias(&self.spec.address).await?)
    }

    async fn create(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        let request = AddAliasRequest {
            address: self.spec.address.clone(),
            goto: self.spec.goto.clone(),
            active: self.spec.active,
        };
        Ok(ctx.api.add_alias(&request).await?)
    }

    fn in_sync(&self, remote: &AliasRecord) -> bool {
        remote.active == Some(self.spec.active)
            && remote
                .goto
                .as_deref()
                .is_some_and(|goto| same_destinations(goto, &self.spec.goto))
    }

    async fn update(
        &self,
        ctx: &SyncContext<'_>,
        _remote: &AliasRecord,
    ) -> Result<(), ReconcilerError> {
        let attr = EditAliasAttr {
            goto: self.spec.goto.clone(),
            active: self.spec.active,
        };
        Ok(ctx.api.edit_alias(&self.spec.address, &attr).await?)
    }

    async fn delete(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        Ok(ctx.api.delete_alias(&self.spec.address).await?)
    }
}
