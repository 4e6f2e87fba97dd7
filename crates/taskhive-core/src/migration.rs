//! Guest-to-account migration: atomic re-ownership of all guest records.
//!
//! A guest session accumulates tasks, groups, tags, and settings before the
//! user ever signs up. On sign-in the client sends "I was guest G, I am now
//! user U"; this service verifies the caller actually is U and re-owns every
//! record attributed to G inside one transaction. Either the whole sweep
//! commits or none of it does — partial migration would strand orphaned
//! guest data next to duplicate-looking account data.

use rusqlite::params;
use tracing::info;

use crate::db::CoreDb;
use crate::error::{MigrationError, StoreError};
use crate::identity::{GuestId, UserId};

/// Outcome of a committed migration. A zero count is a successful no-op:
/// re-invoking after a completed migration finds nothing under the guest id
/// and must never double-transfer.
///
/// `records_dropped` counts guest rows discarded because the account
/// already held a row for the same per-owner unique value (settings keys);
/// the account's value wins.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MigrationReport {
    pub records_moved: usize,
    pub records_dropped: usize,
    pub per_table: Vec<TableReport>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TableReport {
    pub table: &'static str,
    pub moved: usize,
}

#[derive(Clone)]
pub struct MigrationService {
    db: CoreDb,
}

impl MigrationService {
    pub fn new(db: CoreDb) -> Self {
        Self { db }
    }

    /// Re-own every record of `guest` to `target`.
    ///
    /// The caller must be the receiving account itself; anything else is
    /// `Unauthorized` before a single row is read. Storage failure rolls
    /// the whole sweep back and surfaces as `Failed`; retry is the
    /// caller's decision, never automatic.
    pub fn migrate(
        &self,
        guest: &GuestId,
        target: &UserId,
        caller: &UserId,
    ) -> Result<MigrationReport, MigrationError> {
        if caller != target {
            return Err(MigrationError::Unauthorized);
        }
        if guest.is_empty() {
            return Err(MigrationError::BadRequest("guest id is empty"));
        }
        if target.is_empty() {
            return Err(MigrationError::BadRequest("target user id is empty"));
        }

        let mut conn = self.db.open().map_err(MigrationError::Failed)?;
        let report = (|| -> Result<MigrationReport, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut per_table = Vec::with_capacity(CoreDb::OWNABLE.len());
            let mut records_moved = 0;
            let mut records_dropped = 0;
            for entity in CoreDb::OWNABLE {
                // Registry names are compile-time constants, safe to splice.
                if let Some(col) = entity.unique_within_owner {
                    // The account already owns a row for this value; keep it
                    // and drop the guest's duplicate, otherwise the re-own
                    // update would trip the per-owner UNIQUE constraint and
                    // wedge every retry.
                    let sql = format!(
                        "DELETE FROM {t} WHERE {o} = ?1 AND {c} IN \
                         (SELECT {c} FROM {t} WHERE {o} = ?2)",
                        t = entity.table,
                        o = entity.owner_column,
                        c = col,
                    );
                    records_dropped += tx.execute(&sql, params![guest.as_str(), target.as_str()])?;
                }
                let sql = format!(
                    "UPDATE {} SET {} = ?1 WHERE {} = ?2",
                    entity.table, entity.owner_column, entity.owner_column
                );
                let moved = tx.execute(&sql, params![target.as_str(), guest.as_str()])?;
                records_moved += moved;
                per_table.push(TableReport { table: entity.table, moved });
            }
            tx.commit()?;
            Ok(MigrationReport { records_moved, records_dropped, per_table })
        })()
        .map_err(|e| MigrationError::Failed(StoreError::from(e)))?;

        info!(
            guest = %guest.as_str(),
            user = %target.as_str(),
            moved = report.records_moved,
            dropped = report.records_dropped,
            "guest migration committed"
        );
        Ok(report)
    }
}
