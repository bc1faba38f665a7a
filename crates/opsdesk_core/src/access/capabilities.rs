//! Resolved capability predicate for one subject.

use crate::access::matrix::CapabilityMatrix;
use crate::access::AccessError;
use crate::model::role::{Capability, Role};
use serde::Serialize;
use std::collections::BTreeSet;

/// Capability predicate derived from a subject's assigned roles.
///
/// # Invariants
/// - `has(c)` is true iff some assigned role maps to `c` in the matrix.
/// - `is_unprovisioned()` never influences `has`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    roles: BTreeSet<Role>,
    capabilities: BTreeSet<Capability>,
    resolved: bool,
}

impl CapabilitySet {
    /// Predicate for a missing or expired session: grants nothing and is not
    /// considered unprovisioned.
    pub fn anonymous() -> Self {
        Self {
            roles: BTreeSet::new(),
            capabilities: BTreeSet::new(),
            resolved: false,
        }
    }

    /// Predicate for a successfully resolved role set.
    pub fn from_roles(matrix: &CapabilityMatrix, roles: impl IntoIterator<Item = Role>) -> Self {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        let capabilities = matrix.capabilities_for(roles.iter().copied());
        Self {
            roles,
            capabilities,
            resolved: true,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Subject resolved successfully with zero role assignments.
    ///
    /// Only unlocks the first-record bootstrap affordance. Server-side
    /// authorization remains the enforcement point.
    pub fn is_unprovisioned(&self) -> bool {
        self.resolved && self.roles.is_empty()
    }

    /// Whether the set came from a role lookup rather than a missing session.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Returns `AccessError::Denied` when `capability` is not granted.
    pub fn require(&self, capability: Capability) -> Result<(), AccessError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(AccessError::Denied { capability })
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }
}
