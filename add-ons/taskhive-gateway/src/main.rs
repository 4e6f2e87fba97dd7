//! Axum-based API gateway for the Taskhive credential core.
//!
//! Routes:
//! - `POST /api/v1/migrate` — guest-to-account migration (caller identity
//!   from `x-user-id`; session plumbing belongs to the surrounding app)
//! - `/api/v1/admin/pool-keys` — pool-key CRUD, guarded by `x-admin-token`
//! - `/api/v1/settings/api-key` — the principal settings surface that owns
//!   personal credentials
//! - `/api/v1/assist/*` — the AI features that consume resolved credentials,
//!   each with a safe fallback when no credential resolves
//!
//! Config is env-driven (`CoreConfig::from_env`) with `.env` loaded first.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskhive_core::{
    AssistBridge, CoreConfig, CoreDb, CredentialPool, CredentialResolver, MigrationService,
};

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CoreConfig::from_env();
    let db = CoreDb::new(config.db_path.clone())?;
    let pool = CredentialPool::new(db.clone());
    let resolver = CredentialResolver::new(db.clone(), pool.clone());
    let migrations = MigrationService::new(db.clone());
    let mut bridge = AssistBridge::new();
    if let Some(model) = &config.assist_model {
        bridge = bridge.with_model(model);
    }

    if config.admin_token.is_none() {
        info!("TASKHIVE_ADMIN_TOKEN unset; pool-key admin endpoints are disabled");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        pool,
        resolver,
        migrations,
        bridge,
    });

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/migrate", post(handlers::migrate::migrate))
        .route(
            "/api/v1/admin/pool-keys",
            get(handlers::admin::list_keys).post(handlers::admin::create_key),
        )
        .route(
            "/api/v1/admin/pool-keys/:id",
            axum::routing::patch(handlers::admin::toggle_key)
                .delete(handlers::admin::delete_key),
        )
        .route(
            "/api/v1/settings/api-key",
            put(handlers::settings::set_api_key).delete(handlers::settings::clear_api_key),
        )
        .route("/api/v1/assist/score", post(handlers::assist::score))
        .route("/api/v1/assist/subtasks", post(handlers::assist::subtasks))
        .route("/api/v1/assist/group-emoji", post(handlers::assist::group_emoji))
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!(addr = %config.bind_addr, db = %config.db_path.display(), "taskhive gateway listening");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
