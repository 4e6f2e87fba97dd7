//! Shared fallback key pool with least-used-first selection.
//!
//! Administrators register a small set of shared API keys; principals
//! without a personal key draw from this pool. Selection always picks an
//! active key with the minimum `usage_count` and records the usage in the
//! same reservation, so load spreads evenly instead of exhausting one
//! key's upstream quota while others sit idle.
//!
//! The increment is DB-side relative arithmetic (`usage_count = usage_count
//! + 1`), never a value computed in Rust, so concurrent reservations across
//! service instances can lose ordering but never lose an increment's effect
//! on the next selection.

use rusqlite::{params, OptionalExtension};
use tracing::warn;

use crate::db::{now_ms, CoreDb};
use crate::error::{AdminError, StoreError};

/// Administrator-visible pool key row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolKeyRow {
    pub id: String,
    pub api_key: String,
    pub is_active: bool,
    pub usage_count: u64,
    pub created_at_ms: i64,
}

/// A pooled key handed out for one feature invocation. The usage tick has
/// already been recorded; nothing rolls it back if the downstream call
/// fails, since the upstream quota was consumed by the attempt either way.
#[derive(Debug, Clone)]
pub struct ReservedKey {
    pub id: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct CredentialPool {
    db: CoreDb,
}

impl CredentialPool {
    pub fn new(db: CoreDb) -> Self {
        Self { db }
    }

    /// Select the least-used active key and record a usage against it.
    ///
    /// Ties break by id; exact order among equal-usage keys carries no
    /// meaning. Returns `Ok(None)` when the pool is empty or fully
    /// deactivated — never an error for that case.
    pub fn select_and_reserve(&self) -> Result<Option<ReservedKey>, StoreError> {
        let conn = self.db.open()?;
        let selected = conn
            .query_row(
                "SELECT id, api_key FROM pool_keys WHERE is_active = 1 \
                 ORDER BY usage_count ASC, id ASC LIMIT 1",
                [],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((id, api_key)) = selected else {
            return Ok(None);
        };

        // A lost increment skews fairness by one tick; a lost key loses the
        // caller's feature request. Keep the key either way.
        if let Err(e) = conn.execute(
            "UPDATE pool_keys SET usage_count = usage_count + 1 WHERE id = ?1",
            params![id],
        ) {
            warn!(key_id = %id, error = %e, "pool usage increment failed; key returned uncounted");
        }

        Ok(Some(ReservedKey { id, api_key }))
    }

    // ------------------------------------------------------------------
    // Administrator CRUD (authorization enforced at the gateway)
    // ------------------------------------------------------------------

    /// Register new key material. Usage starts at 0, active. Duplicate key
    /// material is rejected.
    pub fn insert_key(&self, api_key: &str) -> Result<PoolKeyRow, AdminError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(AdminError::EmptyKey);
        }
        let conn = self.db.open().map_err(AdminError::Store)?;
        let row = PoolKeyRow {
            id: uuid::Uuid::new_v4().to_string(),
            api_key: key.to_string(),
            is_active: true,
            usage_count: 0,
            created_at_ms: now_ms(),
        };
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO pool_keys (id, api_key, is_active, usage_count, created_at_ms) \
                 VALUES (?1, ?2, 1, 0, ?3)",
                params![row.id, row.api_key, row.created_at_ms],
            )
            .map_err(|e| AdminError::Store(e.into()))?;
        if inserted == 0 {
            return Err(AdminError::DuplicateKey);
        }
        Ok(row)
    }

    /// Toggle a key in or out of selection. Inactive keys keep their usage
    /// count and can be re-enabled later.
    pub fn set_active(&self, id: &str, active: bool) -> Result<(), AdminError> {
        let conn = self.db.open().map_err(AdminError::Store)?;
        let updated = conn
            .execute(
                "UPDATE pool_keys SET is_active = ?1 WHERE id = ?2",
                params![active as i64, id],
            )
            .map_err(|e| AdminError::Store(e.into()))?;
        if updated == 0 {
            return Err(AdminError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn delete_key(&self, id: &str) -> Result<(), AdminError> {
        let conn = self.db.open().map_err(AdminError::Store)?;
        let deleted = conn
            .execute("DELETE FROM pool_keys WHERE id = ?1", params![id])
            .map_err(|e| AdminError::Store(e.into()))?;
        if deleted == 0 {
            return Err(AdminError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn list_keys(&self) -> Result<Vec<PoolKeyRow>, StoreError> {
        let conn = self.db.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, api_key, is_active, usage_count, created_at_ms \
             FROM pool_keys ORDER BY created_at_ms ASC",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(PoolKeyRow {
                    id: r.get(0)?,
                    api_key: r.get(1)?,
                    is_active: r.get::<_, i64>(2)? != 0,
                    usage_count: r.get::<_, i64>(3)? as u64,
                    created_at_ms: r.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
