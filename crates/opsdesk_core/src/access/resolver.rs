//! RoleSet resolver with per-subject memoization.
//!
//! # Responsibility
//! - Load a subject's roles through [`RoleRepository`] and derive its
//!   [`CapabilitySet`].
//! - Cache the result per subject until an explicit invalidation.
//!
//! # Invariants
//! - Only this resolver writes to its cache.
//! - Lookup failures are never cached; the next access retries.
//! - A load issued before an invalidation never commits to the cache.
//! - Tickets are process-monotonic so a forgotten subject cannot collide with
//!   an older in-flight load.

use crate::access::capabilities::CapabilitySet;
use crate::access::matrix::CapabilityMatrix;
use crate::access::AccessError;
use crate::model::role::SubjectId;
use crate::repo::role_repo::RoleRepository;
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug, Default)]
struct ResolverState {
    next_ticket: u64,
    entries: HashMap<SubjectId, SubjectEntry>,
}

#[derive(Debug, Default)]
struct SubjectEntry {
    latest_ticket: u64,
    cached: Option<CapabilitySet>,
}

impl ResolverState {
    fn issue(&mut self, subject_id: SubjectId) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.entries.entry(subject_id).or_default().latest_ticket = ticket;
        ticket
    }
}

/// Resolves subject identity to a memoized capability predicate.
pub struct RoleResolver {
    repo: Arc<dyn RoleRepository>,
    matrix: CapabilityMatrix,
    state: Mutex<ResolverState>,
}

impl RoleResolver {
    /// Creates a resolver over the standard matrix.
    pub fn new(repo: Arc<dyn RoleRepository>) -> Self {
        Self::with_matrix(repo, CapabilityMatrix::standard())
    }

    pub fn with_matrix(repo: Arc<dyn RoleRepository>, matrix: CapabilityMatrix) -> Self {
        Self {
            repo,
            matrix,
            state: Mutex::new(ResolverState::default()),
        }
    }

    pub fn matrix(&self) -> &CapabilityMatrix {
        &self.matrix
    }

    /// Returns the capability predicate for `subject_id`.
    ///
    /// `None` (no or expired session) yields [`CapabilitySet::anonymous`]
    /// without touching the backend.
    ///
    /// # Errors
    /// - `AccessError::RoleLoad` when the backend lookup fails.
    pub async fn resolve(
        &self,
        subject_id: Option<SubjectId>,
    ) -> Result<CapabilitySet, AccessError> {
        let Some(subject_id) = subject_id else {
            return Ok(CapabilitySet::anonymous());
        };

        let ticket = {
            let mut state = self.lock_state();
            if let Some(cached) = state
                .entries
                .get(&subject_id)
                .and_then(|entry| entry.cached.clone())
            {
                debug!("event=role_resolve module=access status=hit subject_id={subject_id}");
                return Ok(cached);
            }
            state.issue(subject_id)
        };

        let started_at = Instant::now();
        let roles = match self.repo.load_roles(subject_id).await {
            Ok(roles) => roles,
            Err(err) => {
                error!(
                    "event=role_resolve module=access status=error subject_id={} duration_ms={} error={}",
                    subject_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(AccessError::RoleLoad {
                    subject_id,
                    source: err,
                });
            }
        };

        let set = CapabilitySet::from_roles(&self.matrix, roles);
        let committed = {
            let mut state = self.lock_state();
            match state.entries.get_mut(&subject_id) {
                Some(entry) if entry.latest_ticket == ticket => {
                    entry.cached = Some(set.clone());
                    true
                }
                _ => false,
            }
        };
        info!(
            "event=role_resolve module=access status=ok subject_id={} roles={} committed={} duration_ms={}",
            subject_id,
            set.roles().count(),
            committed,
            started_at.elapsed().as_millis()
        );
        Ok(set)
    }

    /// Returns the cached predicate without touching the backend.
    pub fn cached(&self, subject_id: SubjectId) -> Option<CapabilitySet> {
        self.lock_state()
            .entries
            .get(&subject_id)
            .and_then(|entry| entry.cached.clone())
    }

    /// Drops the cached predicate after a role-assignment change.
    pub fn invalidate(&self, subject_id: SubjectId) {
        let mut state = self.lock_state();
        state.issue(subject_id);
        if let Some(entry) = state.entries.get_mut(&subject_id) {
            entry.cached = None;
        }
        info!("event=role_invalidate module=access status=ok subject_id={subject_id}");
    }

    /// Forgets everything about `subject_id` (sign-out, re-authentication).
    pub fn forget(&self, subject_id: SubjectId) {
        self.lock_state().entries.remove(&subject_id);
        debug!("event=role_forget module=access status=ok subject_id={subject_id}");
    }

    /// Drops every cached predicate.
    pub fn clear(&self) {
        self.lock_state().entries.clear();
    }

    fn lock_state(&self) -> MutexGuard<'_, ResolverState> {
        // State is plain bookkeeping; a panicked holder leaves it consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
