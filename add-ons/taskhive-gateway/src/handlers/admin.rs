//! Administrator pool-key surface.
//!
//! Guarded by `x-admin-token` against `TASKHIVE_ADMIN_TOKEN`; when the env
//! var is unset the whole surface is disabled. Listings redact key material
//! to a short suffix — full keys never leave the store once registered.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use taskhive_core::{AdminError, PoolKeyRow};

use crate::state::AppState;

fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<Value>)> {
    let expected = state.config.admin_token.as_deref().unwrap_or("");
    let presented = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if expected.is_empty() || presented != expected {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "admin authorization required" })),
        ));
    }
    Ok(())
}

fn redacted(row: &PoolKeyRow) -> Value {
    let suffix: String = row
        .api_key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    json!({
        "id": row.id,
        "key_suffix": suffix,
        "is_active": row.is_active,
        "usage_count": row.usage_count,
        "created_at_ms": row.created_at_ms,
    })
}

fn admin_error(e: AdminError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        AdminError::DuplicateKey => StatusCode::CONFLICT,
        AdminError::EmptyKey => StatusCode::BAD_REQUEST,
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        AdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if let Err(e) = require_admin(&state, &headers) {
        return e;
    }
    match state.pool.list_keys() {
        Ok(rows) => {
            let keys: Vec<Value> = rows.iter().map(redacted).collect();
            (StatusCode::OK, Json(json!({ "keys": keys })))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Deserialize)]
pub struct CreateKeyRequest {
    pub api_key: String,
}

pub async fn create_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateKeyRequest>,
) -> (StatusCode, Json<Value>) {
    if let Err(e) = require_admin(&state, &headers) {
        return e;
    }
    match state.pool.insert_key(&req.api_key) {
        Ok(row) => (StatusCode::CREATED, Json(redacted(&row))),
        Err(e) => admin_error(e),
    }
}

#[derive(Deserialize)]
pub struct ToggleKeyRequest {
    pub is_active: bool,
}

pub async fn toggle_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ToggleKeyRequest>,
) -> (StatusCode, Json<Value>) {
    if let Err(e) = require_admin(&state, &headers) {
        return e;
    }
    match state.pool.set_active(&id, req.is_active) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => admin_error(e),
    }
}

pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if let Err(e) = require_admin(&state, &headers) {
        return e;
    }
    match state.pool.delete_key(&id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => admin_error(e),
    }
}
