//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level console functions to Dart via FRB.
//! - Bridge the async core onto sync calls through one private runtime.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - The console is initialized at most once per process; repeating the
//!   same config is a no-op.
//! - Failures are reported in response envelopes, never as empty data.

use opsdesk_core::db::open_db;
use opsdesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_from_config, ping as ping_inner, Capability, ConsoleConfig, ConsoleSession,
    DbHandle, EntryKind, FeedState, NavEntry, NavigationState, Navigator, Notification,
    NotificationError, SubjectId,
};
use std::sync::{Mutex, OnceLock, PoisonError};
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();
static CONSOLE: OnceLock<Console> = OnceLock::new();

struct Console {
    config: ConsoleConfig,
    session: ConsoleSession,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Initializes the console from a JSON config document.
///
/// Recognized keys: `notification_page_size`, `log_level`, `log_dir`,
/// `db_path`. Missing keys use defaults; `{}` yields an in-memory console.
///
/// # FFI contract
/// - Sync call; opens the database and applies migrations.
/// - Repeating the same config is a no-op; a different config is rejected.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn console_init(config_json: String) -> String {
    match init_console(&config_json) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Starts a session for `subject_id` (UUID string).
#[flutter_rust_bridge::frb(sync)]
pub fn console_sign_in(subject_id: String) -> String {
    let result = parse_subject(&subject_id).and_then(|subject_id| {
        console()?.session.sign_in(subject_id);
        Ok(())
    });
    match result {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Ends the current session and drops its caches. Always succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn console_sign_out() {
    if let Ok(console) = console() {
        console.session.sign_out();
    }
}

/// Notifies the console that `subject_id`'s role assignments changed.
#[flutter_rust_bridge::frb(sync)]
pub fn console_role_assignment_changed(subject_id: String) -> String {
    let result = parse_subject(&subject_id).and_then(|subject_id| {
        console()?.session.on_role_assignment_changed(subject_id);
        Ok(())
    });
    match result {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Capability snapshot for the current subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResponse {
    /// `false` when roles could not be loaded ("permissions unavailable").
    pub ok: bool,
    /// Resolved role names (kebab-case).
    pub roles: Vec<String>,
    /// Granted capability names (kebab-case).
    pub capabilities: Vec<String>,
    /// Signed in and resolved with zero role assignments.
    pub unprovisioned: bool,
    pub message: String,
}

/// Resolves the current subject's capabilities.
///
/// # FFI contract
/// - Sync call; may hit the database on a cache miss.
/// - A lookup failure is `ok=false`, never an empty grant list with `ok=true`.
#[flutter_rust_bridge::frb(sync)]
pub fn console_capabilities() -> CapabilityResponse {
    let result = console().and_then(|console| {
        block_on(console.session.capabilities())?.map_err(|err| err.to_string())
    });
    match result {
        Ok(capabilities) => CapabilityResponse {
            ok: true,
            roles: capabilities
                .roles()
                .map(|role| role.as_str().to_string())
                .collect(),
            capabilities: capabilities
                .capabilities()
                .map(|capability| capability.as_str().to_string())
                .collect(),
            unprovisioned: capabilities.is_unprovisioned(),
            message: String::new(),
        },
        Err(message) => CapabilityResponse {
            ok: false,
            roles: Vec::new(),
            capabilities: Vec::new(),
            unprovisioned: false,
            message,
        },
    }
}

/// Checks one capability by name. Unknown names and lookup failures are `false`.
#[flutter_rust_bridge::frb(sync)]
pub fn console_has_capability(capability: String) -> bool {
    let Ok(capability) = Capability::parse(&capability) else {
        return false;
    };
    let response = console_capabilities();
    response.ok
        && response
            .capabilities
            .iter()
            .any(|granted| granted == capability.as_str())
}

/// One entry of the capability catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityInfo {
    /// Stable id (kebab-case).
    pub id: String,
    pub description: String,
}

/// Lists every capability with its user-facing description, in a fixed order.
#[flutter_rust_bridge::frb(sync)]
pub fn capability_catalog() -> Vec<CapabilityInfo> {
    Capability::ALL
        .into_iter()
        .map(|capability| CapabilityInfo {
            id: capability.as_str().to_string(),
            description: capability.description().to_string(),
        })
        .collect()
}

/// One visible navigation link or action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub id: String,
    pub label: String,
    pub route: String,
    /// `navigation|action`.
    pub kind: String,
}

/// Navigation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    pub items: Vec<NavItem>,
    /// `false` when permissions are unavailable; `items` then holds only
    /// always-visible entries.
    pub permissions_available: bool,
    pub message: String,
}

/// Returns the console navigation filtered for the current subject.
#[flutter_rust_bridge::frb(sync)]
pub fn console_navigation() -> NavigationResponse {
    let state = match console().and_then(|console| block_on(console.session.navigation())) {
        Ok(state) => state,
        Err(message) => {
            return NavigationResponse {
                items: Vec::new(),
                permissions_available: false,
                message,
            }
        }
    };
    let (permissions_available, message) = match &state {
        NavigationState::Ready(_) => (true, String::new()),
        NavigationState::PermissionsUnavailable { message, .. } => (false, message.clone()),
    };
    NavigationResponse {
        items: state.entries().iter().map(to_nav_item).collect(),
        permissions_available,
        message,
    }
}

/// Feed item returned to the notification panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub message: String,
    pub action_target: Option<String>,
    pub created_at: i64,
    pub is_read: bool,
    pub read_at: Option<i64>,
}

/// Feed response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    /// `false` when the feed could not be loaded; render retry, not "empty".
    pub ok: bool,
    pub items: Vec<NotificationItem>,
    pub unread_count: u32,
    /// Badge text (`1`..`99`, `99+`); `None` hides the badge.
    pub badge: Option<String>,
    pub message: String,
}

/// Loads the current subject's notification window.
///
/// # FFI contract
/// - `force_refresh=false` serves the cached window when present.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_feed(force_refresh: bool) -> FeedResponse {
    let result = console().and_then(|console| {
        let client = console
            .session
            .notifications()
            .ok_or_else(|| "no active session".to_string())?;
        if force_refresh {
            block_on(client.refresh())
        } else {
            block_on(client.list())
        }
    });
    let state = match result {
        Ok(result) => FeedState::from_result(result),
        Err(message) => FeedState::Unavailable { message },
    };
    match state {
        FeedState::Loaded(view) => FeedResponse {
            ok: true,
            badge: view.badge_label(),
            unread_count: u32::try_from(view.unread_count).unwrap_or(u32::MAX),
            items: view.items.iter().map(to_notification_item).collect(),
            message: String::new(),
        },
        FeedState::Unavailable { message } => FeedResponse {
            ok: false,
            items: Vec::new(),
            unread_count: 0,
            badge: None,
            message,
        },
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Notifications updated by mark-all-read; `0` for single-item calls.
    pub updated: u64,
    pub message: String,
}

impl ActionResponse {
    fn success(updated: u64) -> Self {
        Self {
            ok: true,
            updated,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            updated: 0,
            message: message.into(),
        }
    }
}

/// Marks one notification read. Already-read is a successful no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_mark_read(notification_id: String) -> ActionResponse {
    let result = parse_notification_id(&notification_id).and_then(|id| {
        let client = active_client()?;
        block_on(client.mark_read(id))?.map_err(|err| describe(&err))
    });
    match result {
        Ok(()) => ActionResponse::success(0),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Marks every unread notification of the current subject as read.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_mark_all_read() -> ActionResponse {
    let result = active_client().and_then(|client| {
        block_on(client.mark_all_read())?.map_err(|err| describe(&err))
    });
    match result {
        Ok(updated) => ActionResponse::success(updated),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Click-through: marks the notification read in the background and returns
/// the route to navigate to, if any.
///
/// `action_target` is the value of the feed row the user clicked, so
/// navigation does not depend on the window still being cached.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_open(
    notification_id: String,
    action_target: Option<String>,
) -> Option<String> {
    let id = parse_notification_id(&notification_id).ok()?;
    let client = active_client().ok()?;
    let runtime = runtime().ok()?;
    let _guard = runtime.enter();

    let capture = RouteCapture::default();
    client.open_target(id, action_target.as_deref(), &capture);
    capture.into_route()
}

#[derive(Default)]
struct RouteCapture {
    route: Mutex<Option<String>>,
}

impl RouteCapture {
    fn into_route(self) -> Option<String> {
        self.route
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for RouteCapture {
    fn navigate(&self, target: &str) {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = Some(target.to_string());
    }
}

fn init_console(config_json: &str) -> Result<(), String> {
    let config = ConsoleConfig::from_json_str(config_json).map_err(|err| err.to_string())?;
    if let Some(existing) = CONSOLE.get() {
        return ensure_same_config(&existing.config, &config);
    }

    init_logging_from_config(&config)?;
    let db = match config.db_path.as_deref() {
        Some(path) => open_db(path).map(DbHandle::new),
        None => DbHandle::in_memory(),
    }
    .map_err(|err| format!("console DB open failed: {err}"))?;
    let session = ConsoleSession::from_db(db, &config);

    let stored = CONSOLE.get_or_init(|| Console { config, session });
    log::info!(
        "event=console_init module=ffi status=ok page_size={}",
        stored.config.notification_page_size
    );
    Ok(())
}

fn ensure_same_config(existing: &ConsoleConfig, requested: &ConsoleConfig) -> Result<(), String> {
    if existing == requested {
        Ok(())
    } else {
        Err("console already initialized with a different config".to_string())
    }
}

fn console() -> Result<&'static Console, String> {
    CONSOLE
        .get()
        .ok_or_else(|| "console not initialized; call console_init first".to_string())
}

fn active_client() -> Result<opsdesk_core::NotificationClient, String> {
    console()?
        .session
        .notifications()
        .ok_or_else(|| "no active session".to_string())
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME
        .get_or_init(|| {
            Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("opsdesk-ffi")
                .enable_all()
                .build()
                .map_err(|err| format!("failed to start async runtime: {err}"))
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, String> {
    Ok(runtime()?.block_on(future))
}

fn parse_subject(raw: &str) -> Result<SubjectId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid subject id `{}`", raw.trim()))
}

fn parse_notification_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid notification id `{}`", raw.trim()))
}

fn describe(err: &NotificationError) -> String {
    match err {
        NotificationError::NotFound(_) => "notification not found".to_string(),
        other => other.to_string(),
    }
}

fn to_nav_item(entry: &NavEntry) -> NavItem {
    NavItem {
        id: entry.id.clone(),
        label: entry.label.clone(),
        route: entry.route.clone(),
        kind: match entry.kind {
            EntryKind::Navigation => "navigation",
            EntryKind::Action => "action",
        }
        .to_string(),
    }
}

fn to_notification_item(item: &Notification) -> NotificationItem {
    NotificationItem {
        id: item.id.to_string(),
        title: item.title.clone(),
        message: item.message.clone(),
        action_target: item.navigation_target().map(str::to_string),
        created_at: item.created_at,
        is_read: item.is_read,
        read_at: item.read_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        capability_catalog, console_capabilities, console_has_capability, console_init, console_navigation,
        console_sign_in, console_sign_out, core_version, ensure_same_config, init_logging,
        notification_mark_read, notification_open, notifications_feed,
        notifications_mark_all_read, parse_subject, ping,
    };
    use opsdesk_core::ConsoleConfig;
    use uuid::Uuid;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn console_init_rejects_invalid_config() {
        let error = console_init(r#"{"notification_page_size": 0}"#.to_string());
        assert!(error.contains("notification_page_size"));
    }

    #[test]
    fn differing_config_is_rejected() {
        let base = ConsoleConfig::default();
        let other = ConsoleConfig {
            notification_page_size: 5,
            ..ConsoleConfig::default()
        };
        assert!(ensure_same_config(&base, &base.clone()).is_ok());
        assert!(ensure_same_config(&base, &other).is_err());
    }

    #[test]
    fn capability_catalog_lists_every_capability_with_description() {
        let catalog = capability_catalog();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog[0].id, "manage-users");
        assert!(catalog.iter().all(|entry| !entry.description.is_empty()));
    }

    #[test]
    fn subject_ids_must_be_uuids() {
        assert!(parse_subject("not-a-uuid").is_err());
        assert!(parse_subject(&format!(" {} ", Uuid::new_v4())).is_ok());
    }

    #[test]
    fn unprovisioned_session_flow() {
        assert_eq!(console_init("{}".to_string()), "");
        assert_eq!(console_init("{}".to_string()), "", "same config is idempotent");

        let subject = Uuid::new_v4().to_string();
        assert_eq!(console_sign_in(subject), "");

        let caps = console_capabilities();
        assert!(caps.ok, "{}", caps.message);
        assert!(caps.unprovisioned);
        assert!(caps.capabilities.is_empty());
        assert!(!console_has_capability("manage-users".to_string()));

        let navigation = console_navigation();
        assert!(navigation.permissions_available);
        let ids: Vec<_> = navigation.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["dashboard", "notifications", "create-user"]);

        let feed = notifications_feed(false);
        assert!(feed.ok, "{}", feed.message);
        assert!(feed.items.is_empty());
        assert_eq!(feed.badge, None);

        let all = notifications_mark_all_read();
        assert!(all.ok, "{}", all.message);
        assert_eq!(all.updated, 0);

        let missing = Uuid::new_v4().to_string();
        let response = notification_mark_read(missing.clone());
        assert!(!response.ok);
        assert!(response.message.contains("not found"));
        assert_eq!(notification_open(missing.clone(), None), None);
        assert_eq!(
            notification_open(missing, Some("/incidents/4".to_string())),
            Some("/incidents/4".to_string()),
            "route comes from the clicked row, not the cache"
        );

        console_sign_out();
        let feed = notifications_feed(false);
        assert!(!feed.ok);
        assert!(feed.message.contains("no active session"));
    }
}
