//! # Domain
//!
//! Quotas are kept in MiB on the resource and reported in bytes by mailcow.
//! The rate limit is only changed through `edit/rl-domain`.

use crate::controller::reconciler::converters::{int64_to_float32, mib_to_bytes};
use crate::controller::reconciler::dkim::sync_dkim;
use crate::controller::reconciler::protocol::{MailcowResource, SyncContext};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{Domain, DomainSpec, ResourceStatus};
use crate::provider::mailcow::{
    AddDomainRequest, DomainRecord, EditDomainAttr, EditRateLimitAttr, RateLimitRecord,
};
use async_trait::async_trait;

fn quota_matches(reported: Option<i64>, desired_mib: i64) -> bool {
    reported == Some(mib_to_bytes(desired_mib))
}

/// Fields sent through `edit/domain`
fn settings_in_sync(spec: &DomainSpec, remote: &DomainRecord) -> bool {
    remote.description.as_deref().unwrap_or_default() == spec.description
        && quota_matches(remote.max_quota_for_domain, spec.quota)
        && quota_matches(remote.max_quota_for_mbox, spec.max_quota)
        && quota_matches(remote.def_quota_for_mbox, spec.default_quota)
        && remote.max_num_mboxes_for_domain == Some(spec.max_mailboxes)
        && remote.active == Some(spec.active)
}

fn rate_limit_in_sync(spec: &DomainSpec, remote: Option<&RateLimitRecord>) -> bool {
    let remote_value = remote.and_then(|rl| rl.value).filter(|v| *v > 0);
    match spec.rate_limit.filter(|v| *v > 0) {
        None => remote_value.is_none(),
        Some(value) => {
            remote_value == Some(value)
                && remote.and_then(|rl| rl.frame.as_deref())
                    == Some(spec.rate_limit_frame.as_str())
        }
    }
}

fn edit_attr(spec: &DomainSpec) -> EditDomainAttr {
    EditDomainAttr {
        description: spec.description.clone(),
        quota: int64_to_float32(spec.quota),
        maxquota: int64_to_float32(spec.max_quota),
        defquota: int64_to_float32(spec.default_quota),
        mailboxes: int64_to_float32(spec.max_mailboxes),
        active: spec.active,
    }
}

fn add_request(spec: &DomainSpec) -> AddDomainRequest {
    AddDomainRequest {
        domain: spec.domain.clone(),
        description: spec.description.clone(),
        quota: int64_to_float32(spec.quota),
        maxquota: int64_to_float32(spec.max_quota),
        defquota: int64_to_float32(spec.default_quota),
        mailboxes: int64_to_float32(spec.max_mailboxes),
        active: spec.active,
        rl_value: spec.rate_limit,
        rl_frame: spec.rate_limit_frame.as_str().to_string(),
    }
}

#[async_trait]
impl MailcowResource for Domain {
    type Remote = DomainRecord;

    const KIND: &'static str = "Domain";

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
        self.spec.domain.clone()
    }

    async fn fetch(&self, ctx: &SyncContext<'_>) -> Result<Option<DomainRecord>, ReconcilerError> {
        Ok(ctx.api.get_domain(&self.spec.domain).await?)
    }

    async fn create(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        Ok(ctx.api.add_domain(&add_request(&self.spec)).await?)
    }

    fn in_sync(&self, remote: &DomainRecord) -> bool {
        settings_in_sync(&self.spec, remote) && rate_limit_in_sync(&self.spec, remote.rl.as_ref())
    }

    async fn update(
        &self,
        ctx: &SyncContext<'_>,
        remote: &DomainRecord,
    ) -> Result<(), ReconcilerError> {
        if !settings_in_sync(&self.spec, remote) {
            ctx.api
                .edit_domain(&self.spec.domain, &edit_attr(&self.spec))
                .await?;
        }
        if !rate_limit_in_sync(&self.spec, remote.rl.as_ref()) {
            let attr = EditRateLimitAttr {
                rl_value: self.spec.rate_limit,
                rl_frame: self.spec.rate_limit_frame.as_str().to_string(),
            };
            ctx.api
                .edit_domain_rate_limit(&self.spec.domain, &attr)
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        Ok(ctx.api.delete_domain(&self.spec.domain).await?)
    }

    async fn post_sync(&self, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
        sync_dkim(self, ctx).await
    }
}
