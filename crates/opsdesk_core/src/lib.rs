//! Core access-control and notification logic for the OpsDesk admin console.
//! This crate is the single source of truth for role, capability and
//! notification read-state invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::capabilities::CapabilitySet;
pub use access::gate::{console_navigation, filter_entries, EntryKind, NavEntry, Requirement};
pub use access::matrix::{CapabilityMatrix, MatrixRow};
pub use access::resolver::RoleResolver;
pub use access::AccessError;
pub use config::{ConfigError, ConsoleConfig};
pub use db::DbHandle;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::notification::{
    feed_order, Notification, NotificationId, NotificationValidationError,
};
pub use model::role::{
    Capability, CapabilityParseError, Role, RoleAssignment, RoleParseError, SubjectId,
};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::role_repo::{RoleRepository, SqliteRoleRepository};
pub use repo::{RepoError, RepoResult};
pub use service::feed::{FeedState, FeedView};
pub use service::notification_service::{
    MutationPhase, MutationTarget, Navigator, NotificationClient, NotificationError,
    NotificationStore,
};
pub use service::session::{ConsoleSession, NavigationState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
