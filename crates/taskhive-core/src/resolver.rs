//! Credential resolution: personal key first, shared pool second.
//!
//! Priority: the principal's own stored key always wins and never ticks a
//! pool counter. Nothing is cached across calls — a key revoked or added in
//! settings takes effect on the very next feature invocation.
//!
//! Availability beats strictness here: a failed personal-key read degrades
//! to the pool (worst case, one extra pooled usage tick) instead of failing
//! the caller's feature request.

use tracing::warn;

use crate::db::CoreDb;
use crate::identity::UserId;
use crate::pool::CredentialPool;

/// A usable credential for one feature invocation.
#[derive(Debug, Clone)]
pub enum Credential {
    /// The principal's own key from settings.
    Personal(String),
    /// A shared pool key; the usage tick is already recorded.
    Pooled { id: String, key: String },
}

impl Credential {
    pub fn key(&self) -> &str {
        match self {
            Credential::Personal(k) => k,
            Credential::Pooled { key, .. } => key,
        }
    }
}

#[derive(Clone)]
pub struct CredentialResolver {
    db: CoreDb,
    pool: CredentialPool,
}

impl CredentialResolver {
    pub fn new(db: CoreDb, pool: CredentialPool) -> Self {
        Self { db, pool }
    }

    /// Resolve a credential for `principal`, or `None` when neither a
    /// personal key nor an active pool key exists. Never errors: callers
    /// proceed with their feature's documented fallback output on `None`.
    pub fn resolve(&self, principal: &UserId) -> Option<Credential> {
        let personal = match self.db.user_credential(principal) {
            Ok(key) => key,
            Err(e) => {
                warn!(user = %principal.as_str(), error = %e,
                    "personal credential lookup failed; falling back to pool");
                None
            }
        };
        if let Some(key) = personal.filter(|k| !k.trim().is_empty()) {
            return Some(Credential::Personal(key));
        }

        match self.pool.select_and_reserve() {
            Ok(Some(reserved)) => Some(Credential::Pooled {
                id: reserved.id,
                key: reserved.api_key,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "pool selection failed; no credential available");
                None
            }
        }
    }
}
