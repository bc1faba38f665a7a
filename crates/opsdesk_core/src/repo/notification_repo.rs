//! Notification repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read a bounded, newest-first window of one recipient's notifications.
//! - Apply the read transition as conditional updates keyed by id/recipient.
//!
//! # Invariants
//! - Window order is `created_at DESC, id ASC`.
//! - Updates never touch rows of another recipient.
//! - `mark_read` on an already-read row is a successful no-op.
//! - `mark_all_read` never touches rows created after the issue cutoff.

use crate::db::DbHandle;
use crate::model::notification::{Notification, NotificationId};
use crate::model::role::SubjectId;
use crate::repo::{RepoError, RepoResult};
use async_trait::async_trait;
use rusqlite::{params, Row};
use uuid::Uuid;

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    recipient_id,
    title,
    message,
    action_target,
    created_at,
    is_read,
    read_at
FROM notifications";

/// Upper bound accepted for one window read.
pub const MAX_WINDOW_LIMIT: u32 = 100;

/// Backend contract for notification reads and read-state mutations.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Returns at most `limit` notifications for `recipient_id`, newest first.
    async fn list_for_recipient(
        &self,
        recipient_id: SubjectId,
        limit: u32,
    ) -> RepoResult<Vec<Notification>>;

    /// Marks one notification read. Returns whether a row changed.
    ///
    /// Returns `RepoError::NotFound` when no row matches `(id, recipient_id)`.
    async fn mark_read(
        &self,
        recipient_id: SubjectId,
        id: NotificationId,
        read_at: i64,
    ) -> RepoResult<bool>;

    /// Marks every unread notification of `recipient_id` created at or before
    /// `issued_at` as read. Returns the number of rows changed.
    async fn mark_all_read(
        &self,
        recipient_id: SubjectId,
        issued_at: i64,
        read_at: i64,
    ) -> RepoResult<u64>;

    /// Persists a notification produced by a business event.
    async fn create_notification(&self, notification: &Notification)
        -> RepoResult<NotificationId>;
}

/// Clamps a requested window size into `1..=MAX_WINDOW_LIMIT`.
pub fn normalize_window_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_WINDOW_LIMIT)
}

/// SQLite-backed notification repository.
#[derive(Debug, Clone)]
pub struct SqliteNotificationRepository {
    db: DbHandle,
}

impl SqliteNotificationRepository {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn list_for_recipient(
        &self,
        recipient_id: SubjectId,
        limit: u32,
    ) -> RepoResult<Vec<Notification>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE recipient_id = ?1
             ORDER BY created_at DESC, id ASC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![
            recipient_id.to_string(),
            i64::from(normalize_window_limit(limit))
        ])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_notification_row(row)?);
        }
        Ok(items)
    }

    async fn mark_read(
        &self,
        recipient_id: SubjectId,
        id: NotificationId,
        read_at: i64,
    ) -> RepoResult<bool> {
        let conn = self.db.lock()?;
        // MAX keeps read_at >= created_at under clock skew.
        let changed = conn.execute(
            "UPDATE notifications
             SET is_read = 1, read_at = MAX(created_at, ?3)
             WHERE id = ?1 AND recipient_id = ?2 AND is_read = 0;",
            params![id.to_string(), recipient_id.to_string(), read_at],
        )?;
        if changed > 0 {
            return Ok(true);
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM notifications WHERE id = ?1 AND recipient_id = ?2
            );",
            params![id.to_string(), recipient_id.to_string()],
            |row| row.get(0),
        )?;
        if exists {
            Ok(false)
        } else {
            Err(RepoError::NotFound(id))
        }
    }

    async fn mark_all_read(
        &self,
        recipient_id: SubjectId,
        issued_at: i64,
        read_at: i64,
    ) -> RepoResult<u64> {
        let conn = self.db.lock()?;
        let changed = conn.execute(
            "UPDATE notifications
             SET is_read = 1, read_at = MAX(created_at, ?3)
             WHERE recipient_id = ?1 AND is_read = 0 AND created_at <= ?2;",
            params![recipient_id.to_string(), issued_at, read_at],
        )?;
        Ok(changed as u64)
    }

    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> RepoResult<NotificationId> {
        notification.validate()?;

        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO notifications (
                id,
                recipient_id,
                title,
                message,
                action_target,
                created_at,
                is_read,
                read_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                notification.id.to_string(),
                notification.recipient_id.to_string(),
                notification.title.as_str(),
                notification.message.as_str(),
                notification.action_target.as_deref(),
                notification.created_at,
                i64::from(notification.is_read),
                notification.read_at,
            ],
        )?;
        Ok(notification.id)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id = parse_uuid_column(row, "id")?;
    let recipient_id = parse_uuid_column(row, "recipient_id")?;

    let is_read = match row.get::<_, i64>("is_read")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_read value `{other}` in notifications.is_read"
            )));
        }
    };

    let notification = Notification {
        id,
        recipient_id,
        title: row.get("title")?,
        message: row.get("message")?,
        action_target: row.get("action_target")?,
        created_at: row.get("created_at")?,
        is_read,
        read_at: row.get("read_at")?,
    };
    notification.validate()?;
    Ok(notification)
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{text}` in notifications.{column}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_window_limit;

    #[test]
    fn window_limit_is_clamped() {
        assert_eq!(normalize_window_limit(0), 1);
        assert_eq!(normalize_window_limit(20), 20);
        assert_eq!(normalize_window_limit(5_000), 100);
    }
}
