//! Role assignment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load the roles currently assigned to one subject.
//! - Provide administrative seeding helpers for the SQLite stand-in.
//!
//! # Invariants
//! - Unknown persisted role strings grant nothing and are skipped.
//! - An empty result is a legitimate state, distinct from a load failure.

use crate::db::DbHandle;
use crate::model::role::{Role, SubjectId};
use crate::repo::RepoResult;
use async_trait::async_trait;
use log::warn;
use rusqlite::params;

/// Backend contract for role lookup.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns roles assigned to `subject_id`, possibly empty.
    async fn load_roles(&self, subject_id: SubjectId) -> RepoResult<Vec<Role>>;
}

/// SQLite-backed role assignment repository.
#[derive(Debug, Clone)]
pub struct SqliteRoleRepository {
    db: DbHandle,
}

impl SqliteRoleRepository {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    /// Assigns one role. Re-assigning an existing role is a no-op.
    pub fn assign_role(&self, subject_id: SubjectId, role: Role) -> RepoResult<()> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO role_assignments (subject_id, role) VALUES (?1, ?2);",
            params![subject_id.to_string(), role.as_str()],
        )?;
        Ok(())
    }

    /// Removes one role. Returns whether an assignment existed.
    pub fn revoke_role(&self, subject_id: SubjectId, role: Role) -> RepoResult<bool> {
        let conn = self.db.lock()?;
        let changed = conn.execute(
            "DELETE FROM role_assignments WHERE subject_id = ?1 AND role = ?2;",
            params![subject_id.to_string(), role.as_str()],
        )?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl RoleRepository for SqliteRoleRepository {
    async fn load_roles(&self, subject_id: SubjectId) -> RepoResult<Vec<Role>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT role FROM role_assignments
             WHERE subject_id = ?1
             ORDER BY role ASC;",
        )?;
        let mut rows = stmt.query([subject_id.to_string()])?;

        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            match Role::parse(&value) {
                Ok(role) => roles.push(role),
                Err(err) => warn!(
                    "event=role_load module=repo status=skip subject_id={} reason=\"{}\"",
                    subject_id, err
                ),
            }
        }
        roles.sort();
        roles.dedup();
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::{RoleRepository, SqliteRoleRepository};
    use crate::db::DbHandle;
    use crate::model::role::Role;
    use rusqlite::params;
    use uuid::Uuid;

    #[tokio::test]
    async fn unknown_persisted_roles_are_skipped() {
        let db = DbHandle::in_memory().expect("in-memory db");
        let repo = SqliteRoleRepository::new(db.clone());
        let subject = Uuid::new_v4();
        repo.assign_role(subject, Role::Auditor).expect("assign");
        db.lock()
            .expect("lock")
            .execute(
                "INSERT INTO role_assignments (subject_id, role) VALUES (?1, 'janitor');",
                params![subject.to_string()],
            )
            .expect("insert unknown role");

        let roles = repo.load_roles(subject).await.expect("load roles");
        assert_eq!(roles, vec![Role::Auditor]);
    }

    #[tokio::test]
    async fn assign_is_idempotent_and_revoke_reports_presence() {
        let repo = SqliteRoleRepository::new(DbHandle::in_memory().expect("in-memory db"));
        let subject = Uuid::new_v4();
        repo.assign_role(subject, Role::Manager).expect("assign");
        repo.assign_role(subject, Role::Manager).expect("assign again");
        assert_eq!(
            repo.load_roles(subject).await.expect("load"),
            vec![Role::Manager]
        );

        assert!(repo.revoke_role(subject, Role::Manager).expect("revoke"));
        assert!(!repo.revoke_role(subject, Role::Manager).expect("revoke again"));
        assert!(repo.load_roles(subject).await.expect("load").is_empty());
    }
}
