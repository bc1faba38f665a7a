//! Role-based access control for console surfaces.
//!
//! # Responsibility
//! - Map assigned roles to capabilities through a static matrix.
//! - Resolve and memoize each subject's capability predicate.
//! - Filter navigation/action descriptors by that predicate.
//!
//! # Invariants
//! - Capabilities are additive across roles.
//! - A failed role lookup is never reported as "no permissions".
//! - The gate is a presentation convenience; the backend still enforces
//!   authorization on every mutation.

use crate::model::role::{Capability, SubjectId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod capabilities;
pub mod gate;
pub mod matrix;
pub mod resolver;

/// Access-control errors.
///
/// `RoleLoad` is an infrastructure fault ("permissions unavailable");
/// `Denied` is an authorization outcome ("not permitted").
#[derive(Debug)]
pub enum AccessError {
    RoleLoad {
        subject_id: SubjectId,
        source: RepoError,
    },
    Denied {
        capability: Capability,
    },
}

impl AccessError {
    /// Whether this is an authorization denial rather than a lookup fault.
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoleLoad { subject_id, source } => {
                write!(f, "permissions unavailable for subject {subject_id}: {source}")
            }
            Self::Denied { capability } => write!(f, "capability not granted: {capability}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RoleLoad { source, .. } => Some(source),
            Self::Denied { .. } => None,
        }
    }
}
