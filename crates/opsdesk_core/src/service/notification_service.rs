//! Notification store client.
//!
//! # Responsibility
//! - Own the process-local, per-subject notification window cache.
//! - Expose list/refresh, mark-read, mark-all-read and click-through.
//!
//! # Invariants
//! - Cache entries are keyed by subject; a mutation invalidates only the
//!   mutating subject's entry.
//! - Reads are ticketed: only the most recently issued read for a subject may
//!   commit, and a mutation's invalidation retires every older ticket.
//! - Mutations run as detached tasks and finish even if the caller goes away.
//! - Failed mutations leave the cached window untouched.
//! - Notification titles and messages are never logged.

use crate::model::notification::{sort_feed, Notification, NotificationId};
use crate::model::role::SubjectId;
use crate::repo::notification_repo::{normalize_window_limit, NotificationRepository};
use crate::repo::RepoError;
use crate::service::feed::unread_count;
use crate::service::now_epoch_ms;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Default window size for one subject's feed.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Which notifications a mutation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    One(NotificationId),
    All,
}

impl Display for MutationTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(id) => write!(f, "notification {id}"),
            Self::All => write!(f, "all unread notifications"),
        }
    }
}

/// Two-phase mutation status: issued, then resolved or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Pending,
    Resolved,
    Failed,
}

/// Notification client errors.
#[derive(Debug)]
pub enum NotificationError {
    /// Window read failed. Render an empty state with retry, not "no items".
    Fetch {
        subject_id: SubjectId,
        source: RepoError,
    },
    /// Read-state update failed. Prior state is intact; retry is safe.
    Mutation {
        target: MutationTarget,
        source: RepoError,
    },
    NotFound(NotificationId),
    /// The detached mutation task did not report back.
    Interrupted {
        target: MutationTarget,
        message: String,
    },
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch { subject_id, source } => {
                write!(f, "failed to load notifications for {subject_id}: {source}")
            }
            Self::Mutation { target, source } => {
                write!(f, "failed to mark {target} as read: {source}")
            }
            Self::NotFound(id) => write!(f, "notification not found: {id}"),
            Self::Interrupted { target, message } => {
                write!(f, "update of {target} was interrupted: {message}")
            }
        }
    }
}

impl Error for NotificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch { source, .. } | Self::Mutation { source, .. } => Some(source),
            Self::NotFound(_) | Self::Interrupted { .. } => None,
        }
    }
}

/// Client-side router used for notification click-through.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

#[derive(Debug, Default)]
struct SubjectWindow {
    latest_ticket: u64,
    items: Option<Arc<Vec<Notification>>>,
    mutations: HashMap<MutationTarget, MutationPhase>,
    last_failure: Option<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    next_ticket: u64,
    windows: HashMap<SubjectId, SubjectWindow>,
}

impl StoreState {
    fn window(&mut self, subject_id: SubjectId) -> &mut SubjectWindow {
        self.windows.entry(subject_id).or_default()
    }

    fn issue(&mut self, subject_id: SubjectId) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.window(subject_id).latest_ticket = ticket;
        ticket
    }
}

struct StoreInner {
    repo: Arc<dyn NotificationRepository>,
    page_size: u32,
    state: Mutex<StoreState>,
}

impl StoreInner {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self, subject_id: SubjectId) -> Result<Vec<Notification>, NotificationError> {
        let ticket = self.lock_state().issue(subject_id);
        let started_at = Instant::now();

        let mut items = match self.repo.list_for_recipient(subject_id, self.page_size).await {
            Ok(items) => items,
            Err(err) => {
                error!(
                    "event=notification_fetch module=service status=error subject_id={} duration_ms={} error={}",
                    subject_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(NotificationError::Fetch {
                    subject_id,
                    source: err,
                });
            }
        };
        sort_feed(&mut items);
        items.truncate(self.page_size as usize);

        let committed = {
            let mut state = self.lock_state();
            match state.windows.get_mut(&subject_id) {
                Some(window) if window.latest_ticket == ticket => {
                    window.items = Some(Arc::new(items.clone()));
                    true
                }
                _ => false,
            }
        };
        info!(
            "event=notification_fetch module=service status=ok subject_id={} count={} committed={} duration_ms={}",
            subject_id,
            items.len(),
            committed,
            started_at.elapsed().as_millis()
        );
        Ok(items)
    }

    fn begin_mutation(&self, subject_id: SubjectId, target: MutationTarget) {
        self.lock_state()
            .window(subject_id)
            .mutations
            .insert(target, MutationPhase::Pending);
    }

    fn finish_mutation(
        &self,
        subject_id: SubjectId,
        target: MutationTarget,
        failure: Option<String>,
    ) {
        let mut state = self.lock_state();
        if !state.windows.contains_key(&subject_id) {
            // Forgotten while the mutation was in flight.
            return;
        }
        if failure.is_none() {
            state.issue(subject_id);
        }
        let window = state.window(subject_id);
        match failure {
            None => {
                window.items = None;
                window.mutations.insert(target, MutationPhase::Resolved);
                window.last_failure = None;
            }
            Some(message) => {
                window.mutations.insert(target, MutationPhase::Failed);
                window.last_failure = Some(message);
            }
        }
    }

    async fn run_mark_read(
        &self,
        subject_id: SubjectId,
        id: NotificationId,
    ) -> Result<(), NotificationError> {
        let target = MutationTarget::One(id);
        match self.repo.mark_read(subject_id, id, now_epoch_ms()).await {
            Ok(changed) => {
                self.finish_mutation(subject_id, target, None);
                info!(
                    "event=notification_mark_read module=service status=ok subject_id={subject_id} notification_id={id} changed={changed}"
                );
                Ok(())
            }
            Err(err) => {
                self.finish_mutation(subject_id, target, Some(err.to_string()));
                error!(
                    "event=notification_mark_read module=service status=error subject_id={subject_id} notification_id={id} error={err}"
                );
                Err(match err {
                    RepoError::NotFound(id) => NotificationError::NotFound(id),
                    other => NotificationError::Mutation {
                        target,
                        source: other,
                    },
                })
            }
        }
    }

    async fn run_mark_all_read(
        &self,
        subject_id: SubjectId,
        issued_at: i64,
    ) -> Result<u64, NotificationError> {
        let target = MutationTarget::All;
        match self
            .repo
            .mark_all_read(subject_id, issued_at, now_epoch_ms())
            .await
        {
            Ok(updated) => {
                self.finish_mutation(subject_id, target, None);
                info!(
                    "event=notification_mark_all_read module=service status=ok subject_id={subject_id} updated={updated}"
                );
                Ok(updated)
            }
            Err(err) => {
                self.finish_mutation(subject_id, target, Some(err.to_string()));
                error!(
                    "event=notification_mark_all_read module=service status=error subject_id={subject_id} error={err}"
                );
                Err(NotificationError::Mutation {
                    target,
                    source: err,
                })
            }
        }
    }
}

/// Process-local owner of every subject's notification cache.
///
/// Cloning is cheap and shares the same caches.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<StoreInner>,
}

impl NotificationStore {
    pub fn new(repo: Arc<dyn NotificationRepository>, page_size: u32) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                repo,
                page_size: normalize_window_limit(page_size),
                state: Mutex::new(StoreState::default()),
            }),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// Returns a handle scoped to one subject.
    pub fn client(&self, subject_id: SubjectId) -> NotificationClient {
        NotificationClient {
            store: self.clone(),
            subject_id,
        }
    }

    /// Drops one subject's cache entry and retires its in-flight reads.
    pub fn forget(&self, subject_id: SubjectId) {
        let mut state = self.inner.lock_state();
        state.windows.remove(&subject_id);
        debug!("event=notification_forget module=service status=ok subject_id={subject_id}");
    }
}

/// Per-subject notification client.
#[derive(Clone)]
pub struct NotificationClient {
    store: NotificationStore,
    subject_id: SubjectId,
}

impl NotificationClient {
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// Returns the cached window, fetching it when absent or invalidated.
    ///
    /// # Errors
    /// - `NotificationError::Fetch` when the backend read fails.
    pub async fn list(&self) -> Result<Vec<Notification>, NotificationError> {
        if let Some(items) = self.cached() {
            return Ok(items);
        }
        self.refresh().await
    }

    /// Always re-reads the window. Safe to call repeatedly.
    ///
    /// A result superseded by a newer read is still returned to this caller
    /// but does not replace the cached window.
    pub async fn refresh(&self) -> Result<Vec<Notification>, NotificationError> {
        self.store.inner.fetch(self.subject_id).await
    }

    /// Cached window without touching the backend.
    pub fn cached(&self) -> Option<Vec<Notification>> {
        let state = self.store.inner.lock_state();
        state
            .windows
            .get(&self.subject_id)
            .and_then(|window| window.items.as_ref())
            .map(|items| items.to_vec())
    }

    /// Unread entries in the cached window; `0` when nothing is cached.
    pub fn unread_count(&self) -> usize {
        let state = self.store.inner.lock_state();
        state
            .windows
            .get(&self.subject_id)
            .and_then(|window| window.items.as_deref())
            .map_or(0, |items| unread_count(items))
    }

    /// Discards the cached window so the next `list` re-fetches.
    pub fn invalidate(&self) {
        let mut state = self.store.inner.lock_state();
        state.issue(self.subject_id);
        state.window(self.subject_id).items = None;
    }

    /// Marks one notification read. Already-read is a successful no-op.
    ///
    /// # Errors
    /// - `NotificationError::NotFound` when the id is not owned by this subject.
    /// - `NotificationError::Mutation` when the backend update fails.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), NotificationError> {
        let target = MutationTarget::One(id);
        let inner = Arc::clone(&self.store.inner);
        let subject_id = self.subject_id;
        inner.begin_mutation(subject_id, target);

        let task = tokio::spawn(async move { inner.run_mark_read(subject_id, id).await });
        task.await
            .map_err(|err| self.interrupted(target, err.to_string()))?
    }

    /// Marks every unread notification issued up to now as read.
    ///
    /// Returns the number of notifications updated; `0` is a success.
    pub async fn mark_all_read(&self) -> Result<u64, NotificationError> {
        let target = MutationTarget::All;
        let inner = Arc::clone(&self.store.inner);
        let subject_id = self.subject_id;
        let issued_at = now_epoch_ms();
        inner.begin_mutation(subject_id, target);

        let task =
            tokio::spawn(async move { inner.run_mark_all_read(subject_id, issued_at).await });
        task.await
            .map_err(|err| self.interrupted(target, err.to_string()))?
    }

    /// Click-through on a displayed feed row: fire-and-forget mark-read,
    /// then navigate when the row carries a target. Returns whether
    /// navigation happened.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&self, notification: &Notification, navigator: &dyn Navigator) -> bool {
        self.open_target(notification.id, notification.navigation_target(), navigator)
    }

    /// Same as [`NotificationClient::open`] for callers that only hold the
    /// row's id and action target. Blank targets do not navigate.
    pub fn open_target(
        &self,
        id: NotificationId,
        action_target: Option<&str>,
        navigator: &dyn Navigator,
    ) -> bool {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(err) = client.mark_read(id).await {
                warn!(
                    "event=notification_open module=service status=degraded notification_id={id} error={err}"
                );
            }
        });

        match action_target.map(str::trim).filter(|route| !route.is_empty()) {
            Some(route) => {
                navigator.navigate(route);
                true
            }
            None => false,
        }
    }

    /// Latest phase of a mutation issued through this store, if any.
    pub fn mutation_phase(&self, target: MutationTarget) -> Option<MutationPhase> {
        let state = self.store.inner.lock_state();
        state
            .windows
            .get(&self.subject_id)
            .and_then(|window| window.mutations.get(&target).copied())
    }

    /// Message of the most recent failed mutation, cleared by a later success.
    pub fn last_failure(&self) -> Option<String> {
        let state = self.store.inner.lock_state();
        state
            .windows
            .get(&self.subject_id)
            .and_then(|window| window.last_failure.clone())
    }

    fn interrupted(&self, target: MutationTarget, message: String) -> NotificationError {
        self.store
            .inner
            .finish_mutation(self.subject_id, target, Some(message.clone()));
        NotificationError::Interrupted { target, message }
    }
}
