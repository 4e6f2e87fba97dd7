//! taskhive-core: credential resolution and guest-migration core for the
//! Taskhive task manager.
//!
//! Two operations carry the engineering weight of the whole backend:
//!
//! - **resolve**: supply a usable AI credential for a principal — their own
//!   key when they have one, otherwise the least-used key from a shared,
//!   administrator-managed pool ([`CredentialResolver`], [`CredentialPool`]).
//! - **migrate**: atomically re-own everything a guest session created into
//!   the account that session just signed up for ([`MigrationService`]).
//!
//! Everything else here (store, bridge, config) exists to serve those two.

mod bridge;
mod config;
mod db;
mod error;
mod identity;
mod migration;
mod pool;
mod resolver;

pub use bridge::{AssistBridge, FALLBACK_GROUP_EMOJI, FALLBACK_SCORE};
pub use config::CoreConfig;
pub use db::{CoreDb, OwnableEntity};
pub use error::{AdminError, BridgeError, MigrationError, StoreError};
pub use identity::{GuestId, Identity, UserId};
pub use migration::{MigrationReport, MigrationService, TableReport};
pub use pool::{CredentialPool, PoolKeyRow, ReservedKey};
pub use resolver::{Credential, CredentialResolver};
