//! Error types for the credential core, one enum per concern.

use thiserror::Error;

/// Storage-layer failure (SQLite).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Administrator pool-key operation failure.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("pool key material already registered")]
    DuplicateKey,
    #[error("pool key material is empty")]
    EmptyKey,
    #[error("pool key not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Guest-to-account migration failure. `Unauthorized` and `BadRequest` are
/// rejected before any read or write; `Failed` always means the transaction
/// rolled back with no partial effect.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("caller is not the migration target account")]
    Unauthorized,
    #[error("bad migration request: {0}")]
    BadRequest(&'static str),
    #[error("migration transaction failed: {0}")]
    Failed(#[from] StoreError),
}

/// Upstream assist-model call failure. Callers fall back to the feature's
/// documented default output; this never reaches the end user as an error.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("assist request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assist API error {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("assist response had no choices")]
    EmptyResponse,
}
