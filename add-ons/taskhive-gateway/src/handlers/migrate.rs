//! Migration handler: "I was guest G, I am now user U".
//!
//! The target account is always the caller itself; the service re-checks
//! that invariant, the handler just maps outcomes to status codes. Failure
//! leaves guest data intact and retryable, so 500 here means "try again",
//! never "half your tasks moved".

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use taskhive_core::{GuestId, MigrationError};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct MigrateRequest {
    pub guest_id: String,
}

pub async fn migrate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<MigrateRequest>,
) -> (StatusCode, Json<Value>) {
    let caller = match super::caller(&headers) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let guest = GuestId::new(req.guest_id);
    match state.migrations.migrate(&guest, &caller, &caller) {
        Ok(report) => (StatusCode::OK, Json(json!({ "status": "ok", "report": report }))),
        Err(MigrationError::Unauthorized) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "caller is not the migration target" })),
        ),
        Err(MigrationError::BadRequest(msg)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
        }
        Err(e @ MigrationError::Failed(_)) => {
            warn!(error = %e, "migration failed; guest data unchanged");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "migration failed, no data was moved; retry later" })),
            )
        }
    }
}
