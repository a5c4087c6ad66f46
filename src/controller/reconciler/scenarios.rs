//! Whole-pass behaviour of the shared protocol against in-memory collaborators.

use crate::controller::reconciler::conditions::STATUS_TRUE;
use crate::controller::reconciler::converters::mib_to_bytes;
use crate::controller::reconciler::protocol::{reconcile, MailcowResource};
use crate::controller::reconciler::testing::{
    alias, domain, domain_admin, domain_record, mailbox, Call, Harness, NAMESPACE,
};
use crate::crd::{Alias, Domain, DomainAdmin, Mailbox, ResourceStatus};
use crate::provider::mailcow::{
    AddDkimRequest, DkimRecord, DomainAdminRecord, EditDomainAdminAttr, EditMailboxAttr,
    EditRateLimitAttr, MailcowError,
};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;

fn true_conditions(status: &ResourceStatus) -> Vec<&str> {
    status
        .conditions
        .iter()
        .filter(|c| c.status == STATUS_TRUE)
        .map(|c| c.r#type.as_str())
        .collect()
}

fn stored_status<K: MailcowResource>(harness: &Harness<K>, name: &str) -> ResourceStatus {
    harness
        .objects
        .get(NAMESPACE, name)
        .and_then(|o| o.status().cloned())
        .unwrap()
}

#[tokio::test]
async fn test_first_passes_add_finalizer_then_progressing() {
    let harness = Harness::<Alias>::connected();
    let object = alias(NAMESPACE, "info");
    harness.objects.insert(object.clone());
    let ctx = harness.context();

    let action = reconcile(Arc::new(object.clone()), ctx.clone()).await.unwrap();
    assert_eq!(action, Action::requeue(Duration::ZERO));
    assert_eq!(harness.objects.meta_writes(), 1);
    assert!(harness.api.calls().is_empty());

    let action = reconcile(Arc::new(object), ctx).await.unwrap();
    assert_eq!(action, Action::requeue(Duration::ZERO));
    let status = stored_status(&harness, "info");
    assert_eq!(status.phase.as_deref(), Some("Progressing"));
    assert_eq!(
        status.condition("Progressing").unwrap().reason.as_deref(),
        Some("Reconciling")
    );
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn test_domain_creation_generates_and_publishes_dkim() {
    let harness = Harness::<Domain>::connected();
    let object = domain(NAMESPACE, "example-com");
    harness.objects.insert(object.clone());

    let action = harness.settle(&object).await.unwrap();
    assert_eq!(action, Action::requeue(Duration::from_secs(300)));

    let calls = harness.api.calls();
    assert_eq!(calls.len(), 2, "{calls:?}");
    match &calls[0] {
        Call::AddDomain(request) => {
            assert_eq!(request.domain, "example.com");
            assert!((request.quota - 1024.0).abs() < f32::EPSILON);
            assert_eq!(request.rl_value, Some(100));
        }
        other => panic!("expected add_domain, got {other:?}"),
    }
    assert_eq!(
        calls[1],
        Call::AddDkim(AddDkimRequest {
            domains: "example.com".to_string(),
            key_size: 2048.0,
            dkim_selector: "dkim".to_string(),
        })
    );
    let dkim_lookups = harness
        .api
        .gets()
        .iter()
        .filter(|g| g.as_str() == "get_dkim:example.com")
        .count();
    assert_eq!(dkim_lookups, 2);

    let config_map = harness
        .config_maps
        .get_map(NAMESPACE, "dkim-example-com")
        .unwrap();
    let data = config_map.data.unwrap();
    let mut keys: Vec<&str> = data.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["length", "pubkey", "selector", "txt"]);
    assert_eq!(data["selector"], "dkim");
    let owners = config_map.metadata.owner_references.unwrap();
    let owner = &owners[0];
    assert_eq!(owner.kind, "Domain");
    assert_eq!(owner.uid, "uid-example-com");

    let status = stored_status(&harness, "example-com");
    assert_eq!(status.phase.as_deref(), Some("Ready"));
    assert_eq!(true_conditions(&status), vec!["Ready"]);
    assert_eq!(
        status.condition("Ready").unwrap().message.as_deref(),
        Some("Domain successfully reconciled")
    );
}

#[tokio::test]
async fn test_second_pass_is_idempotent() {
    let harness = Harness::<Domain>::connected();
    let object = domain(NAMESPACE, "example-com");
    harness.objects.insert(object.clone());
    harness.settle(&object).await.unwrap();

    harness.api.clear_calls();
    let status_before = stored_status(&harness, "example-com");
    let status_writes = harness.objects.status_writes();
    let meta_writes = harness.objects.meta_writes();
    let config_map_writes = harness.config_maps.writes();

    let action = harness.settle(&object).await.unwrap();

    assert_eq!(action, Action::requeue(Duration::from_secs(300)));
    assert!(harness.api.calls().is_empty(), "{:?}", harness.api.calls());
    assert_eq!(harness.objects.status_writes(), status_writes);
    assert_eq!(harness.objects.meta_writes(), meta_writes);
    assert_eq!(harness.config_maps.writes(), config_map_writes);
    assert_eq!(stored_status(&harness, "example-com"), status_before);
}

#[tokio::test]
async fn test_domain_drift_sends_only_the_drifted_edit() {
    let harness = Harness::<Domain>::connected();
    let object = domain(NAMESPACE, "example-com");
    let mut record = domain_record(&object.spec);
    record.rl = None;
    harness.api.put_domain(record);
    harness.objects.insert(object.clone());

    harness.settle(&object).await.unwrap();

    let edits: Vec<Call> = harness
        .api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::EditDomain(..) | Call::EditDomainRateLimit(..)))
        .collect();
    assert_eq!(
        edits,
        vec![Call::EditDomainRateLimit(
            "example.com".to_string(),
            EditRateLimitAttr {
                rl_value: Some(100),
                rl_frame: "h".to_string(),
            }
        )]
    );
}

#[tokio::test]
async fn test_domain_settings_drift_uses_primary_edit() {
    let harness = Harness::<Domain>::connected();
    let object = domain(NAMESPACE, "example-com");
    let mut record = domain_record(&object.spec);
    record.description = Some("Old description".to_string());
    record.max_quota_for_domain = Some(mib_to_bytes(10));
    harness.api.put_domain(record);
    harness.objects.insert(object.clone());

    harness.settle(&object).await.unwrap();

    let calls = harness.api.calls();
    assert!(matches!(&calls[0], Call::EditDomain(id, attr)
        if id == "example.com" && attr.description == "Example"));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, Call::EditDomainRateLimit(..) | Call::AddDomain(_))));
    assert_eq!(
        harness.api.domain("example.com").unwrap().max_quota_for_domain,
        Some(mib_to_bytes(1024))
    );
}

#[tokio::test]
async fn test_danger_response_marks_degraded() {
    let harness = Harness::<Domain>::connected();
    let object = domain(NAMESPACE, "example-com");
    harness.objects.insert(object.clone());
    harness
        .api
        .fail_on("add_domain", MailcowError::Danger("quota exceeded".to_string()));

    let err = harness.settle(&object).await.unwrap_err();
    assert_eq!(err.reason(), "RemoteRejection");

    let stored = harness.objects.get(NAMESPACE, "example-com").unwrap();
    assert!(crate::controller::reconciler::finalizer::has_finalizer(&stored));
    let status = stored.status.unwrap();
    assert_eq!(status.phase.as_deref(), Some("Degraded"));
    assert_eq!(true_conditions(&status), vec!["Degraded"]);
    let degraded = status.condition("Degraded").unwrap();
    assert_eq!(degraded.reason.as_deref(), Some("RemoteRejection"));
    assert_eq!(degraded.message.as_deref(), Some("quota exceeded"));
    // Progressing is kept with its last reason
    assert_eq!(
        status.condition("Progressing").unwrap().reason.as_deref(),
        Some("Reconciling")
    );
}

#[tokio::test]
async fn test_recovery_after_failure_becomes_ready() {
    let harness = Harness::<Domain>::connected();
    let object = domain(NAMESPACE, "example-com");
    harness.objects.insert(object.clone());
    harness
        .api
        .fail_on("add_domain", MailcowError::Danger("quota exceeded".to_string()));
    harness.settle(&object).await.unwrap_err();

    harness.settle(&object).await.unwrap();

    let status = stored_status(&harness, "example-com");
    assert_eq!(true_conditions(&status), vec!["Ready"]);
    assert_eq!(
        status.condition("Degraded").unwrap().message.as_deref(),
        Some("quota exceeded")
    );
}

#[tokio::test]
async fn test_missing_connection_is_reference_error() {
    let harness = Harness::<Alias>::new();
    let object = alias(NAMESPACE, "info");
    harness.objects.insert(object.clone());

    let err = harness.settle(&object).await.unwrap_err();
    assert_eq!(err.reason(), "ReferenceError");
    let status = stored_status(&harness, "info");
    assert_eq!(status.phase.as_deref(), Some("Degraded"));
    assert!(harness.api.calls().is_empty());
}

#[tokio::test]
async fn test_mailbox_create_sends_password_and_update_does_not() {
    let harness = Harness::<Mailbox>::connected();
    harness
        .secrets
        .insert(NAMESPACE, "user-password", "password", b"hunter2hunter2");
    let mut object = mailbox(NAMESPACE, "user");
    harness.objects.insert(object.clone());

    harness.settle(&object).await.unwrap();
    assert_eq!(
        harness.api.calls(),
        vec![Call::AddMailbox("user@example.com".to_string())]
    );
    assert_eq!(harness.api.passwords(), vec!["hunter2hunter2".to_string()]);

    // Owner disables the mailbox and changes the display name
    harness.api.clear_calls();
    let mut stored = harness.objects.get(NAMESPACE, &object.name_any()).unwrap();
    stored.spec.active = false;
    stored.spec.name = "Renamed".to_string();
    stored.metadata.generation = Some(2);
    harness.objects.insert(stored.clone());
    object = stored;

    harness.settle(&object).await.unwrap();
    assert_eq!(
        harness.api.calls(),
        vec![Call::EditMailbox(
            "user@example.com".to_string(),
            EditMailboxAttr {
                active: false,
                quota: Some(1024.0),
            }
        )]
    );
    assert_eq!(harness.api.passwords().len(), 1);
}

#[tokio::test]
async fn test_mailbox_deletion_removes_remote_then_finalizer() {
    let harness = Harness::<Mailbox>::connected();
    harness
        .secrets
        .insert(NAMESPACE, "user-password", "password", b"secret");
    let object = mailbox(NAMESPACE, "user");
    harness.objects.insert(object.clone());
    harness.settle(&object).await.unwrap();
    harness.api.clear_calls();

    harness.objects.mark_deleted(NAMESPACE, &object.name_any());
    let action = harness.settle(&object).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(
        harness.api.calls(),
        vec![Call::DeleteMailbox(vec!["user@example.com".to_string()])]
    );
    assert!(harness.objects.get(NAMESPACE, &object.name_any()).is_none());
}

#[tokio::test]
async fn test_deleting_absent_mailbox_only_drops_finalizer() {
    let harness = Harness::<Mailbox>::connected();
    let mut object = mailbox(NAMESPACE, "user");
    crate::controller::reconciler::finalizer::add_finalizer(&mut object);
    harness.objects.insert(object.clone());
    harness.objects.mark_deleted(NAMESPACE, &object.name_any());

    harness.settle(&object).await.unwrap();

    assert!(harness.api.calls().is_empty());
    assert!(harness.objects.get(NAMESPACE, &object.name_any()).is_none());
}

#[tokio::test]
async fn test_failed_delete_keeps_finalizer() {
    let harness = Harness::<Alias>::connected();
    let object = alias(NAMESPACE, "info");
    harness.objects.insert(object.clone());
    harness.settle(&object).await.unwrap();

    harness.objects.mark_deleted(NAMESPACE, "info");
    harness.api.fail_on(
        "delete_alias",
        MailcowError::BadRequest("alias is in use".to_string()),
    );

    let err = harness.settle(&object).await.unwrap_err();
    assert_eq!(err.message(), "alias is in use");

    let stored = harness.objects.get(NAMESPACE, "info").unwrap();
    assert!(crate::controller::reconciler::finalizer::has_finalizer(&stored));
    let status = stored.status.unwrap();
    assert_eq!(true_conditions(&status), vec!["Degraded"]);

    // The retry deletes and releases the object
    harness.settle(&object).await.unwrap();
    assert!(harness.objects.get(NAMESPACE, "info").is_none());
    assert!(harness
        .api
        .calls()
        .contains(&Call::DeleteAlias(vec!["info@example.com".to_string()])));
}

#[tokio::test]
async fn test_deletion_without_finalizer_is_left_alone() {
    let harness = Harness::<Alias>::connected();
    let object = alias(NAMESPACE, "info");
    harness.objects.insert(object.clone());
    harness.objects.mark_deleted(NAMESPACE, "info");

    let action = harness.settle(&object).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert!(harness.api.gets().is_empty());
    assert_eq!(harness.objects.meta_writes(), 0);
}

#[tokio::test]
async fn test_vanished_object_is_a_no_op() {
    let harness = Harness::<Alias>::connected();
    let object = alias(NAMESPACE, "gone");

    let action = harness.settle(&object).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert!(harness.api.gets().is_empty());
}

#[tokio::test]
async fn test_domain_admin_lookup_scans_list() {
    let harness = Harness::<DomainAdmin>::connected();
    harness
        .secrets
        .insert(NAMESPACE, "admin-password", "password", b"admin-secret");
    harness.api.put_admin(DomainAdminRecord {
        username: Some("someone-else".to_string()),
        active: Some(true),
        selected_domains: vec!["other.example".to_string()],
    });
    let object = domain_admin(NAMESPACE, "admin", &["example.com"]);
    harness.objects.insert(object.clone());

    harness.settle(&object).await.unwrap();
    assert_eq!(
        harness.api.calls(),
        vec![Call::AddDomainAdmin("admin".to_string())]
    );
    assert_eq!(harness.api.passwords(), vec!["admin-secret".to_string()]);

    // A new domain for the admin is a drift on the domain set only
    harness.api.clear_calls();
    let mut stored = harness.objects.get(NAMESPACE, "admin").unwrap();
    stored.spec.domains.push("example.org".to_string());
    harness.objects.insert(stored.clone());

    harness.settle(&stored).await.unwrap();
    assert_eq!(
        harness.api.calls(),
        vec![Call::EditDomainAdmin(
            "admin".to_string(),
            EditDomainAdminAttr {
                active: true,
                domains: vec!["example.com".to_string(), "example.org".to_string()],
            }
        )]
    );
}

#[tokio::test]
async fn test_conditions_stay_exclusive_across_passes() {
    let harness = Harness::<Alias>::connected();
    let object = alias(NAMESPACE, "info");
    harness.objects.insert(object.clone());
    let ctx = harness.context();

    harness.api.fail_on("get_alias", MailcowError::Unauthorized);
    for _ in 0..6 {
        let _ = reconcile(Arc::new(object.clone()), ctx.clone()).await;
        if let Some(status) = harness.objects.get(NAMESPACE, "info").and_then(|o| o.status) {
            assert!(true_conditions(&status).len() <= 1);
        }
    }
    assert_eq!(true_conditions(&stored_status(&harness, "info")), vec!["Ready"]);
}

async fn run_until_settled<K: MailcowResource>(
    object: &K,
    ctx: &Arc<crate::controller::reconciler::Reconciler<K>>,
) -> Result<Action, crate::controller::reconciler::ReconcilerError> {
    for _ in 0..10 {
        let action = reconcile(Arc::new(object.clone()), ctx.clone()).await?;
        if action != Action::requeue(Duration::ZERO) {
            return Ok(action);
        }
    }
    panic!("reconciliation did not settle");
}

#[tokio::test]
async fn test_finalized_object_forgets_its_backoff() {
    use crate::runtime::error_policy::handle_reconciliation_error;

    let harness = Harness::<Alias>::connected();
    let ctx = harness.context();
    let object = alias(NAMESPACE, "info");
    harness.objects.insert(object.clone());
    run_until_settled(&object, &ctx).await.unwrap();

    harness.objects.mark_deleted(NAMESPACE, "info");
    harness.api.fail_on(
        "delete_alias",
        MailcowError::Danger("alias is in use".to_string()),
    );
    let err = run_until_settled(&object, &ctx).await.unwrap_err();
    handle_reconciliation_error(Arc::new(object.clone()), &err, ctx.clone());

    run_until_settled(&object, &ctx).await.unwrap();
    assert!(harness.objects.get(NAMESPACE, "info").is_none());

    // A later object with the same name starts from the minimum delay
    assert!(!ctx.backoff.reset("mail/info"));
    let (delay, count) = ctx.backoff.record_failure("mail/info");
    assert_eq!((delay, count), (Duration::from_secs(60), 1));
}

#[tokio::test]
async fn test_vanished_object_forgets_its_backoff() {
    let harness = Harness::<Alias>::connected();
    let ctx = harness.context();
    ctx.backoff.record_failure("mail/gone");
    ctx.backoff.record_failure("mail/gone");

    let action = run_until_settled(&alias(NAMESPACE, "gone"), &ctx).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert!(!ctx.backoff.reset("mail/gone"));
}

#[tokio::test]
async fn test_partial_dkim_record_is_published() {
    let harness = Harness::<Domain>::connected();
    harness.api.generate_dkim_as(DkimRecord {
        dkim_selector: Some("dkim".to_string()),
        length: Some("2048".to_string()),
        ..DkimRecord::default()
    });
    let object = domain(NAMESPACE, "example-com");
    harness.objects.insert(object.clone());

    harness.settle(&object).await.unwrap();

    let config_map = harness
        .config_maps
        .get_map(NAMESPACE, "dkim-example-com")
        .expect("partial DKIM record should still be published");
    let data = config_map.data.unwrap();
    let mut keys: Vec<&str> = data.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["length", "selector"]);
    assert_eq!(data["length"], "2048");
}
