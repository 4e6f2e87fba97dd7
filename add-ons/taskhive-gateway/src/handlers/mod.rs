pub mod admin;
pub mod assist;
pub mod migrate;
pub mod settings;

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use taskhive_core::UserId;

/// Caller identity from the `x-user-id` header. Real session validation is
/// the surrounding app's middleware; the gateway only needs a principal id.
pub(crate) fn caller(headers: &HeaderMap) -> Result<UserId, (StatusCode, Json<Value>)> {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if id.is_empty() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing x-user-id" })),
        ));
    }
    Ok(UserId::new(id))
}
