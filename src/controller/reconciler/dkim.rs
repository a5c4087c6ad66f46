//! # DKIM Publication
//!
//! Publishes the DKIM key of a domain to a ConfigMap named
//! `dkim-<resource name>`, owned by the Domain so it is garbage collected with it.
//!
//! A key is generated (2048 bits, selector `dkim`) when mailcow has none yet.

use crate::constants::{DKIM_CONFIGMAP_PREFIX, DKIM_KEY_SIZE, DKIM_SELECTOR};
use crate::controller::reconciler::protocol::SyncContext;
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::Domain;
use crate::provider::mailcow::{AddDkimRequest, DkimRecord};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const KEY_SELECTOR: &str = "selector";
pub const KEY_TXT: &str = "txt";
pub const KEY_LENGTH: &str = "length";
pub const KEY_PUBKEY: &str = "pubkey";

/// Name of the ConfigMap holding the DKIM key of `domain`
pub fn config_map_name(domain: &Domain) -> String {
    format!("{DKIM_CONFIGMAP_PREFIX}{}", domain.name_any())
}

/// ConfigMap data for a DKIM record; absent fields are left out
pub fn dkim_data(record: &DkimRecord) -> BTreeMap<String, String> {
    [
        (KEY_SELECTOR, &record.dkim_selector),
        (KEY_TXT, &record.dkim_txt),
        (KEY_LENGTH, &record.length),
        (KEY_PUBKEY, &record.pubkey),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
    .collect()
}

/// Make sure the domain has a DKIM key and publish it
pub async fn sync_dkim(domain: &Domain, ctx: &SyncContext<'_>) -> Result<(), ReconcilerError> {
    let record = ensure_dkim_key(&domain.spec.domain, ctx).await?;
    let Some(record) = record else {
        debug!("No DKIM key available for {} yet", domain.spec.domain);
        return Ok(());
    };
    publish(domain, &record, ctx).await
}

async fn ensure_dkim_key(
    domain_name: &str,
    ctx: &SyncContext<'_>,
) -> Result<Option<DkimRecord>, ReconcilerError> {
    let existing = ctx.api.get_dkim(domain_name).await?;
    if let Some(record) = existing.filter(|r| r.dkim_txt.is_some()) {
        return Ok(Some(record));
    }

    info!("Generating DKIM key for {}", domain_name);
    ctx.api
        .add_dkim(&AddDkimRequest {
            domains: domain_name.to_string(),
            key_size: DKIM_KEY_SIZE,
            dkim_selector: DKIM_SELECTOR.to_string(),
        })
        .await?;

    Ok(ctx.api.get_dkim(domain_name).await?)
}

async fn publish(
    domain: &Domain,
    record: &DkimRecord,
    ctx: &SyncContext<'_>,
) -> Result<(), ReconcilerError> {
    let namespace = domain.namespace().unwrap_or_default();
    let name = config_map_name(domain);
    let data = dkim_data(record);

    match ctx.config_maps.get(&namespace, &name).await? {
        None => {
            let config_map = ConfigMap {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    namespace: Some(namespace.clone()),
                    owner_references: domain.controller_owner_ref(&()).map(|r| vec![r]),
                    ..ObjectMeta::default()
                },
                data: Some(data),
                ..ConfigMap::default()
            };
            ctx.config_maps.create(&namespace, &config_map).await?;
            info!(
                "Published DKIM key of {} to ConfigMap {}/{}",
                domain.spec.domain, namespace, name
            );
        }
        Some(existing) if existing.data.as_ref() == Some(&data) => {
            debug!("ConfigMap {}/{} is up to date", namespace, name);
        }
        Some(mut existing) => {
            existing.data = Some(data);
            ctx.config_maps.replace(&namespace, &existing).await?;
            info!("Updated DKIM ConfigMap {}/{}", namespace, name);
        }
    }
    Ok(())
}
