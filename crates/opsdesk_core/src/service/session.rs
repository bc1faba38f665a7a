//! Console session lifecycle.
//!
//! # Responsibility
//! - Hold the authenticated subject for one console process.
//! - Route capability and notification access through their owning components.
//!
//! # Invariants
//! - Signing in forgets the subject's cached roles (re-authentication).
//! - Signing out drops the subject's role and notification caches.
//! - Role-change events invalidate only the affected subject.

use crate::access::capabilities::CapabilitySet;
use crate::access::gate::{console_navigation, filter_entries, NavEntry};
use crate::access::resolver::RoleResolver;
use crate::access::AccessError;
use crate::config::ConsoleConfig;
use crate::db::DbHandle;
use crate::model::role::SubjectId;
use crate::repo::notification_repo::SqliteNotificationRepository;
use crate::repo::role_repo::SqliteRoleRepository;
use crate::service::notification_service::{NotificationClient, NotificationStore};
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

/// Navigation surface state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    Ready(Vec<NavEntry>),
    /// Role lookup failed: only always-visible entries, plus a notice.
    PermissionsUnavailable {
        entries: Vec<NavEntry>,
        message: String,
    },
}

impl NavigationState {
    pub fn entries(&self) -> &[NavEntry] {
        match self {
            Self::Ready(entries) | Self::PermissionsUnavailable { entries, .. } => entries,
        }
    }
}

/// Process-wide session state with an explicit lifecycle.
pub struct ConsoleSession {
    resolver: Arc<RoleResolver>,
    notifications: NotificationStore,
    subject: RwLock<Option<SubjectId>>,
}

impl ConsoleSession {
    pub fn new(resolver: Arc<RoleResolver>, notifications: NotificationStore) -> Self {
        Self {
            resolver,
            notifications,
            subject: RwLock::new(None),
        }
    }

    /// Wires SQLite-backed repositories over one shared connection.
    pub fn from_db(db: DbHandle, config: &ConsoleConfig) -> Self {
        let resolver = RoleResolver::new(Arc::new(SqliteRoleRepository::new(db.clone())));
        let notifications = NotificationStore::new(
            Arc::new(SqliteNotificationRepository::new(db)),
            config.notification_page_size,
        );
        Self::new(Arc::new(resolver), notifications)
    }

    pub fn subject(&self) -> Option<SubjectId> {
        *self.subject.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sign_in(&self, subject_id: SubjectId) {
        self.resolver.forget(subject_id);
        let previous = self
            .subject
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subject_id);
        if let Some(previous) = previous.filter(|previous| *previous != subject_id) {
            self.drop_caches(previous);
        }
        info!("event=session_sign_in module=service status=ok subject_id={subject_id}");
    }

    pub fn sign_out(&self) {
        let previous = self
            .subject
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subject_id) = previous {
            self.drop_caches(subject_id);
            info!("event=session_sign_out module=service status=ok subject_id={subject_id}");
        }
    }

    /// Role assignments of `subject_id` changed outside this process.
    pub fn on_role_assignment_changed(&self, subject_id: SubjectId) {
        self.resolver.invalidate(subject_id);
    }

    /// Capability predicate for the current subject.
    pub async fn capabilities(&self) -> Result<CapabilitySet, AccessError> {
        self.resolver.resolve(self.subject()).await
    }

    /// Console navigation filtered for the current subject.
    pub async fn navigation(&self) -> NavigationState {
        let entries = console_navigation();
        match self.capabilities().await {
            Ok(capabilities) => NavigationState::Ready(filter_entries(&capabilities, &entries)),
            Err(err) => NavigationState::PermissionsUnavailable {
                entries: filter_entries(&CapabilitySet::anonymous(), &entries),
                message: err.to_string(),
            },
        }
    }

    /// Notification client for the current subject; `None` when signed out.
    pub fn notifications(&self) -> Option<NotificationClient> {
        self.subject()
            .map(|subject_id| self.notifications.client(subject_id))
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    fn drop_caches(&self, subject_id: SubjectId) {
        self.resolver.forget(subject_id);
        self.notifications.forget(subject_id);
    }
}
