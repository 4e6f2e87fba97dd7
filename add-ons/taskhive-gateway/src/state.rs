//! Shared gateway state: the core services behind every handler.

use taskhive_core::{
    AssistBridge, CoreConfig, CoreDb, CredentialPool, CredentialResolver, MigrationService,
};

pub struct AppState {
    pub config: CoreConfig,
    pub db: CoreDb,
    pub pool: CredentialPool,
    pub resolver: CredentialResolver,
    pub migrations: MigrationService,
    pub bridge: AssistBridge,
}
