mod common;

use common::ScriptedRoles;
use opsdesk_core::{
    console_navigation, filter_entries, AccessError, Capability, ConsoleSession, DbHandle,
    NavEntry, NavigationState, NotificationStore, Role, RoleResolver, SqliteNotificationRepository,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

fn scripted_resolver() -> (Arc<RoleResolver>, Arc<ScriptedRoles>, DbHandle) {
    let db = DbHandle::in_memory().unwrap();
    let roles = ScriptedRoles::new(db.clone());
    (Arc::new(RoleResolver::new(roles.clone())), roles, db)
}

fn visible_ids(entries: &[NavEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.id.as_str()).collect()
}

fn session_over(resolver: Arc<RoleResolver>, db: DbHandle) -> ConsoleSession {
    let repo = Arc::new(SqliteNotificationRepository::new(db));
    ConsoleSession::new(resolver, NotificationStore::new(repo, 20))
}

#[tokio::test]
async fn admin_hr_manager_union_grants_users_contracts_inventory_only() {
    let (resolver, roles, _) = scripted_resolver();
    let subject = Uuid::new_v4();
    roles.inner.assign_role(subject, Role::AdminHr).unwrap();
    roles.inner.assign_role(subject, Role::Manager).unwrap();

    let caps = resolver.resolve(Some(subject)).await.unwrap();
    assert!(caps.has(Capability::ManageUsers));
    assert!(caps.has(Capability::ManageContracts));
    assert!(caps.has(Capability::ManageInventory));
    assert!(!caps.has(Capability::ViewAuditLogs));
    assert!(!caps.has(Capability::ManageSafetyHygiene));
}

#[tokio::test]
async fn resolution_is_memoized_until_invalidated() {
    let (resolver, roles, _) = scripted_resolver();
    let subject = Uuid::new_v4();
    roles.inner.assign_role(subject, Role::Auditor).unwrap();

    resolver.resolve(Some(subject)).await.unwrap();
    resolver.resolve(Some(subject)).await.unwrap();
    assert_eq!(roles.calls(), 1);

    roles.inner.assign_role(subject, Role::SafetyOfficer).unwrap();
    resolver.invalidate(subject);
    let caps = resolver.resolve(Some(subject)).await.unwrap();
    assert_eq!(roles.calls(), 2);
    assert!(caps.has(Capability::ManageSafetyHygiene));
    assert!(caps.has(Capability::ViewAuditLogs));
}

#[tokio::test]
async fn role_load_failure_is_not_a_denial_and_is_not_cached() {
    let (resolver, roles, _) = scripted_resolver();
    let subject = Uuid::new_v4();
    roles.inner.assign_role(subject, Role::Superadmin).unwrap();

    roles.fail.store(true, Ordering::SeqCst);
    let err = resolver.resolve(Some(subject)).await.unwrap_err();
    assert!(matches!(err, AccessError::RoleLoad { subject_id, .. } if subject_id == subject));
    assert!(!err.is_denial());
    assert!(resolver.cached(subject).is_none());

    roles.fail.store(false, Ordering::SeqCst);
    let caps = resolver.resolve(Some(subject)).await.unwrap();
    assert!(Capability::ALL.iter().all(|capability| caps.has(*capability)));
}

#[tokio::test]
async fn subject_without_assignments_is_unprovisioned_and_bootstrap_applies() {
    let (resolver, _, _) = scripted_resolver();
    let caps = resolver.resolve(Some(Uuid::new_v4())).await.unwrap();
    assert!(caps.is_unprovisioned());
    assert!(Capability::ALL.iter().all(|capability| !caps.has(*capability)));

    let entries = filter_entries(&caps, &console_navigation());
    let ids = visible_ids(&entries);
    assert!(ids.contains(&"create-user"));
    assert!(!ids.contains(&"users"));
    assert!(!ids.contains(&"create-contract"));
}

#[tokio::test]
async fn employee_is_provisioned_but_sees_only_always_visible_entries() {
    let (resolver, roles, _) = scripted_resolver();
    let subject = Uuid::new_v4();
    roles.inner.assign_role(subject, Role::Employee).unwrap();

    let caps = resolver.resolve(Some(subject)).await.unwrap();
    assert!(!caps.is_unprovisioned());
    let entries = filter_entries(&caps, &console_navigation());
    let ids = visible_ids(&entries);
    assert_eq!(ids, vec!["dashboard", "notifications"]);
}

#[tokio::test]
async fn missing_session_resolves_anonymous_without_backend_call() {
    let (resolver, roles, _) = scripted_resolver();
    let caps = resolver.resolve(None).await.unwrap();
    assert!(!caps.is_unprovisioned());
    assert!(caps.require(Capability::ManageUsers).unwrap_err().is_denial());
    assert_eq!(roles.calls(), 0);
}

#[tokio::test]
async fn session_reports_permissions_unavailable_on_role_failure() {
    let (resolver, roles, db) = scripted_resolver();
    let session = session_over(resolver, db);
    let subject = Uuid::new_v4();
    roles.inner.assign_role(subject, Role::Manager).unwrap();
    session.sign_in(subject);

    roles.fail.store(true, Ordering::SeqCst);
    match session.navigation().await {
        NavigationState::PermissionsUnavailable { entries, message } => {
            assert_eq!(visible_ids(&entries), vec!["dashboard", "notifications"]);
            assert!(message.contains("permissions unavailable"));
        }
        other => panic!("expected degraded navigation, got {other:?}"),
    }

    roles.fail.store(false, Ordering::SeqCst);
    let ready = session.navigation().await;
    assert!(matches!(ready, NavigationState::Ready(_)));
    let ids = visible_ids(ready.entries());
    assert!(ids.contains(&"contracts"));
    assert!(ids.contains(&"create-contract"));
    assert!(!ids.contains(&"users"));
}

#[tokio::test]
async fn sign_in_as_other_subject_drops_previous_caches() {
    let (resolver, roles, db) = scripted_resolver();
    let session = session_over(resolver, db);
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    roles.inner.assign_role(first, Role::Auditor).unwrap();

    session.sign_in(first);
    session.capabilities().await.unwrap();
    session.notifications().unwrap().list().await.unwrap();

    session.sign_in(second);
    assert!(session.resolver().cached(first).is_none());
    assert_eq!(session.subject(), Some(second));
    assert!(session.capabilities().await.unwrap().is_unprovisioned());
}
