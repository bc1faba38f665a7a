//! Notification domain model.
//!
//! # Responsibility
//! - Define the per-recipient notification record.
//! - Provide the monotonic read-state transition.
//! - Define the stable feed ordering.
//!
//! # Invariants
//! - `read_at` is set if and only if `is_read` is true.
//! - `is_read` never flips back to `false` through this crate.
//! - Feed order is `created_at DESC`, ties broken by `id ASC`.

use crate::model::role::SubjectId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one notification.
pub type NotificationId = Uuid;

/// Notification owned by one recipient subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: SubjectId,
    pub title: String,
    pub message: String,
    /// Client-side route opened on click-through. `None` is a valid state.
    pub action_target: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub is_read: bool,
    /// Unix epoch milliseconds. Present exactly when `is_read` is true.
    pub read_at: Option<i64>,
}

impl Notification {
    /// Creates an unread notification with a generated id.
    pub fn new(
        recipient_id: SubjectId,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            title: title.into(),
            message: message.into(),
            action_target: None,
            created_at,
            is_read: false,
            read_at: None,
        }
    }

    /// Builder-style setter for the click-through route.
    pub fn with_action_target(mut self, target: impl Into<String>) -> Self {
        self.action_target = Some(target.into());
        self
    }

    /// Applies the read transition.
    ///
    /// Returns `true` when the state changed. An already-read notification
    /// keeps its original `read_at`.
    pub fn mark_read(&mut self, at: i64) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        true
    }

    /// Whether the notification carries a non-blank click-through route.
    pub fn navigation_target(&self) -> Option<&str> {
        self.action_target
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
    }

    /// Validates record invariants before persistence or after read-back.
    pub fn validate(&self) -> Result<(), NotificationValidationError> {
        if self.title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        match (self.is_read, self.read_at) {
            (true, None) => Err(NotificationValidationError::ReadWithoutTimestamp),
            (false, Some(_)) => Err(NotificationValidationError::TimestampWithoutRead),
            (true, Some(read_at)) if read_at < self.created_at => {
                Err(NotificationValidationError::ReadBeforeCreated {
                    created_at: self.created_at,
                    read_at,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Total order used for every rendered feed.
pub fn feed_order(a: &Notification, b: &Notification) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts notifications in place using [`feed_order`].
pub fn sort_feed(items: &mut [Notification]) {
    items.sort_by(feed_order);
}

/// Notification invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyTitle,
    ReadWithoutTimestamp,
    TimestampWithoutRead,
    ReadBeforeCreated { created_at: i64, read_at: i64 },
}

impl Display for NotificationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "notification title must not be empty"),
            Self::ReadWithoutTimestamp => write!(f, "read notification is missing read_at"),
            Self::TimestampWithoutRead => write!(f, "unread notification must not carry read_at"),
            Self::ReadBeforeCreated {
                created_at,
                read_at,
            } => write!(
                f,
                "read_at {read_at} is earlier than created_at {created_at}"
            ),
        }
    }
}

impl Error for NotificationValidationError {}
