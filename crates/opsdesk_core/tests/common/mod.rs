#![allow(dead_code)]

use async_trait::async_trait;
use opsdesk_core::{
    DbHandle, Notification, NotificationId, NotificationRepository, RepoError, RepoResult, Role,
    RoleRepository, SqliteNotificationRepository, SqliteRoleRepository, SubjectId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Holds the next list call after it has read from the database.
#[derive(Clone, Default)]
pub struct Hold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// SQLite-backed notification repository with scripted faults and holds.
pub struct ScriptedNotifications {
    inner: SqliteNotificationRepository,
    pub fail_list: AtomicBool,
    pub fail_mutations: AtomicBool,
    list_calls: Mutex<HashMap<SubjectId, usize>>,
    hold: Mutex<Option<Hold>>,
}

impl ScriptedNotifications {
    pub fn new(db: DbHandle) -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteNotificationRepository::new(db),
            fail_list: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            list_calls: Mutex::new(HashMap::new()),
            hold: Mutex::new(None),
        })
    }

    pub fn arm_hold(&self) -> Hold {
        let hold = Hold::default();
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn list_calls(&self, subject_id: SubjectId) -> usize {
        self.list_calls
            .lock()
            .unwrap()
            .get(&subject_id)
            .copied()
            .unwrap_or(0)
    }

    fn mutation_fault(&self) -> RepoResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("scripted mutation failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for ScriptedNotifications {
    async fn list_for_recipient(
        &self,
        recipient_id: SubjectId,
        limit: u32,
    ) -> RepoResult<Vec<Notification>> {
        *self
            .list_calls
            .lock()
            .unwrap()
            .entry(recipient_id)
            .or_default() += 1;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("scripted list failure".to_string()));
        }

        let result = self.inner.list_for_recipient(recipient_id, limit).await;
        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
        result
    }

    async fn mark_read(
        &self,
        recipient_id: SubjectId,
        id: NotificationId,
        read_at: i64,
    ) -> RepoResult<bool> {
        self.mutation_fault()?;
        self.inner.mark_read(recipient_id, id, read_at).await
    }

    async fn mark_all_read(
        &self,
        recipient_id: SubjectId,
        issued_at: i64,
        read_at: i64,
    ) -> RepoResult<u64> {
        self.mutation_fault()?;
        self.inner
            .mark_all_read(recipient_id, issued_at, read_at)
            .await
    }

    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> RepoResult<NotificationId> {
        self.inner.create_notification(notification).await
    }
}

/// SQLite-backed role repository with a scripted fault switch.
pub struct ScriptedRoles {
    pub inner: SqliteRoleRepository,
    pub fail: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedRoles {
    pub fn new(db: DbHandle) -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteRoleRepository::new(db),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleRepository for ScriptedRoles {
    async fn load_roles(&self, subject_id: SubjectId) -> RepoResult<Vec<Role>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("scripted role failure".to_string()));
        }
        self.inner.load_roles(subject_id).await
    }
}

/// Inserts `count` unread notifications with `created_at = base + index`.
pub async fn seed_notifications(
    repo: &dyn NotificationRepository,
    recipient_id: SubjectId,
    count: usize,
    base_created_at: i64,
) -> Vec<Notification> {
    let mut created = Vec::with_capacity(count);
    for index in 0..count {
        let notification = Notification::new(
            recipient_id,
            format!("Notice {index}"),
            "body",
            base_created_at + index as i64,
        );
        repo.create_notification(&notification).await.unwrap();
        created.push(notification);
    }
    created
}

/// Polls `condition` until it holds or a short deadline passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
