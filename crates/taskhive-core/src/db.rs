//! Local SQLite store for the credential core.
//!
//! Bare-metal local DB, one connection per operation, `foreign_keys=ON`
//! enforced on every open. Owns four concerns:
//!
//! - `user_credentials` — per-principal personal API key (written by the
//!   settings surface, read by the resolver)
//! - `pool_keys` — administrator-supplied fallback keys with usage counters
//! - ownable entity tables (`tasks`, `task_groups`, `tags`, `user_settings`)
//!   that the migration sweep re-owns; their full CRUD lives elsewhere in
//!   the app, only the owner-column helpers needed here are exposed
//!
//! [`CoreDb::OWNABLE`] is the registry the migration service iterates, so
//! adding an ownable table is one registry line plus its schema.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::identity::{Identity, UserId};

/// A record type subject to guest-to-account re-ownership.
#[derive(Debug, Clone, Copy)]
pub struct OwnableEntity {
    pub table: &'static str,
    pub owner_column: &'static str,
    /// Column that is UNIQUE per owner. When the target already holds a row
    /// with the same value, the guest's duplicate is dropped during
    /// migration instead of colliding with the constraint.
    pub unique_within_owner: Option<&'static str>,
}

#[derive(Clone)]
pub struct CoreDb {
    db_path: PathBuf,
}

pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl CoreDb {
    /// Every table whose rows a guest can own. The migration sweep iterates
    /// this registry rather than hardcoding table names.
    pub const OWNABLE: &'static [OwnableEntity] = &[
        OwnableEntity { table: "tasks", owner_column: "owner_id", unique_within_owner: None },
        OwnableEntity { table: "task_groups", owner_column: "owner_id", unique_within_owner: None },
        OwnableEntity { table: "tags", owner_column: "owner_id", unique_within_owner: None },
        OwnableEntity {
            table: "user_settings",
            owner_column: "owner_id",
            unique_within_owner: Some("setting_key"),
        },
    ];

    pub fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        let this = Self { db_path };
        this.init()?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub(crate) fn open(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        // SQLite default is OFF unless set per connection.
        let _ = conn.pragma_update(None, "foreign_keys", "ON");
        Ok(conn)
    }

    fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = self.open()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_credentials (
                user_id TEXT PRIMARY KEY,
                api_key TEXT NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pool_keys (
                id TEXT PRIMARY KEY,
                api_key TEXT NOT NULL UNIQUE,
                is_active INTEGER NOT NULL DEFAULT 1,
                usage_count INTEGER NOT NULL DEFAULT 0 CHECK (usage_count >= 0),
                created_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pool_keys_selection
                ON pool_keys(is_active, usage_count);

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);

            CREATE TABLE IF NOT EXISTS task_groups (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                emoji TEXT NULL,
                created_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_task_groups_owner ON task_groups(owner_id);

            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tags_owner ON tags(owner_id);

            CREATE TABLE IF NOT EXISTS user_settings (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                setting_key TEXT NOT NULL,
                setting_value TEXT NOT NULL,
                UNIQUE(owner_id, setting_key)
            );
            CREATE INDEX IF NOT EXISTS idx_user_settings_owner ON user_settings(owner_id);
            "#,
        )
        .map_err(StoreError::from)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Personal credentials (settings surface writes, resolver reads)
    // ------------------------------------------------------------------

    pub fn user_credential(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        let conn = self.open()?;
        let key: Option<String> = conn
            .query_row(
                "SELECT api_key FROM user_credentials WHERE user_id = ?1",
                params![user.as_str()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(key)
    }

    pub fn set_user_credential(&self, user: &UserId, api_key: &str) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO user_credentials (user_id, api_key, updated_at_ms)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                api_key = excluded.api_key,
                updated_at_ms = excluded.updated_at_ms
            "#,
            params![user.as_str(), api_key.trim(), now_ms()],
        )?;
        Ok(())
    }

    pub fn clear_user_credential(&self, user: &UserId) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM user_credentials WHERE user_id = ?1",
            params![user.as_str()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ownable entity helpers (seeding + counting for migration and tests)
    // ------------------------------------------------------------------

    pub fn insert_task(&self, owner: &Identity, title: &str) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO tasks (id, owner_id, title, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![id, owner.owner_key(), title, now_ms()],
        )?;
        Ok(id)
    }

    pub fn insert_group(&self, owner: &Identity, name: &str) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO task_groups (id, owner_id, name, emoji, created_at_ms) VALUES (?1, ?2, ?3, NULL, ?4)",
            params![id, owner.owner_key(), name, now_ms()],
        )?;
        Ok(id)
    }

    pub fn insert_tag(&self, owner: &Identity, name: &str) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO tags (id, owner_id, name, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![id, owner.owner_key(), name, now_ms()],
        )?;
        Ok(id)
    }

    pub fn insert_setting(
        &self,
        owner: &Identity,
        key: &str,
        value: &str,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO user_settings (id, owner_id, setting_key, setting_value)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(owner_id, setting_key) DO UPDATE SET
                setting_value = excluded.setting_value
            "#,
            params![id, owner.owner_key(), key, value],
        )?;
        Ok(id)
    }

    pub fn setting_value(
        &self,
        owner: &Identity,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.open()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT setting_value FROM user_settings WHERE owner_id = ?1 AND setting_key = ?2",
                params![owner.owner_key(), key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Rows owned by `owner` in one registry table.
    pub fn count_in(&self, entity: &OwnableEntity, owner: &Identity) -> Result<usize, StoreError> {
        let conn = self.open()?;
        // Registry names are compile-time constants, safe to splice.
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            entity.table, entity.owner_column
        );
        let n: i64 = conn.query_row(&sql, params![owner.owner_key()], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Total rows owned by `owner` across every registry table.
    pub fn owned_count(&self, owner: &Identity) -> Result<usize, StoreError> {
        let mut total = 0;
        for entity in Self::OWNABLE {
            total += self.count_in(entity, owner)?;
        }
        Ok(total)
    }
}
