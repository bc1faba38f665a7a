//! Data-access contracts for the external backend and a SQLite implementation.
//!
//! # Responsibility
//! - Define the async operations core needs from the hosted data backend.
//! - Isolate SQL details from resolver and store-client orchestration.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Backend faults are reported as errors, never as empty results.

use crate::db::DbError;
use crate::model::notification::{NotificationId, NotificationValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod notification_repo;
pub mod role_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by role and notification data access.
#[derive(Debug)]
pub enum RepoError {
    Validation(NotificationValidationError),
    Db(DbError),
    NotFound(NotificationId),
    InvalidData(String),
    /// Backend could not be reached or refused the request.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "notification not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Unavailable(message) => write!(f, "backend unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<NotificationValidationError> for RepoError {
    fn from(value: NotificationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
