//! Principal settings surface: the one writer of personal credentials.
//!
//! The resolver only ever reads `user_credentials`; this handler pair is
//! where a user's own key enters or leaves the store. Changes apply on the
//! very next resolve call since nothing is cached.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

pub async fn set_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SetApiKeyRequest>,
) -> (StatusCode, Json<Value>) {
    let caller = match super::caller(&headers) {
        Ok(c) => c,
        Err(e) => return e,
    };
    if req.api_key.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "api_key is empty" })),
        );
    }
    match state.db.set_user_credential(&caller, &req.api_key) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

pub async fn clear_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let caller = match super::caller(&headers) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match state.db.clear_user_credential(&caller) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
