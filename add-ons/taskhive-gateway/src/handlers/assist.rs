//! AI-assist handlers: the credential consumers.
//!
//! Contract with the core: resolve a credential per invocation; on `None`
//! (or any upstream failure) proceed with the feature's documented fallback
//! output. A user with no working credential of any kind gets degraded
//! suggestions, never an error page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use taskhive_core::{Credential, FALLBACK_GROUP_EMOJI, FALLBACK_SCORE};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct TaskRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct GroupRequest {
    pub name: String,
}

/// Resolve a credential for the caller, honoring the master assist toggle.
fn resolve_for(state: &AppState, headers: &HeaderMap) -> Result<Option<Credential>, (StatusCode, Json<Value>)> {
    let caller = super::caller(headers)?;
    if !state.config.assist_enabled {
        return Ok(None);
    }
    Ok(state.resolver.resolve(&caller))
}

pub async fn score(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TaskRequest>,
) -> (StatusCode, Json<Value>) {
    let credential = match resolve_for(&state, &headers) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let (score, source) = match credential {
        Some(cred) => match state.bridge.score_task(&cred, &req.title).await {
            Ok(s) => (s, "ai"),
            Err(e) => {
                warn!(error = %e, "score call failed; using fallback");
                (FALLBACK_SCORE, "fallback")
            }
        },
        None => (FALLBACK_SCORE, "fallback"),
    };
    (StatusCode::OK, Json(json!({ "score": score, "source": source })))
}

pub async fn subtasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TaskRequest>,
) -> (StatusCode, Json<Value>) {
    let credential = match resolve_for(&state, &headers) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let (subtasks, source) = match credential {
        Some(cred) => match state.bridge.suggest_subtasks(&cred, &req.title).await {
            Ok(list) => (list, "ai"),
            Err(e) => {
                warn!(error = %e, "subtask call failed; using fallback");
                (Vec::new(), "fallback")
            }
        },
        None => (Vec::new(), "fallback"),
    };
    (StatusCode::OK, Json(json!({ "subtasks": subtasks, "source": source })))
}

pub async fn group_emoji(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<GroupRequest>,
) -> (StatusCode, Json<Value>) {
    let credential = match resolve_for(&state, &headers) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let (emoji, source) = match credential {
        Some(cred) => match state.bridge.suggest_group_emoji(&cred, &req.name).await {
            Ok(e) => (e, "ai"),
            Err(e) => {
                warn!(error = %e, "emoji call failed; using fallback");
                (FALLBACK_GROUP_EMOJI.to_string(), "fallback")
            }
        },
        None => (FALLBACK_GROUP_EMOJI.to_string(), "fallback"),
    };
    (StatusCode::OK, Json(json!({ "emoji": emoji, "source": source })))
}

#[cfg(test)]
mod tests {
    //! The safe-default contract: a caller with no usable credential (or an
    //! unreachable assist upstream) always gets the documented fallback
    //! output with `"source": "fallback"`, never an error response.

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use taskhive_core::{
        AssistBridge, CoreConfig, CoreDb, CredentialPool, CredentialResolver, MigrationService,
    };

    fn temp_state(assist_enabled: bool, bridge: AssistBridge) -> Arc<AppState> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let db_path = std::env::temp_dir()
            .join(format!("taskhive-assist-{}-{nanos}.db", std::process::id()));
        let db = CoreDb::new(db_path.clone()).unwrap();
        let pool = CredentialPool::new(db.clone());
        let resolver = CredentialResolver::new(db.clone(), pool.clone());
        let migrations = MigrationService::new(db.clone());
        Arc::new(AppState {
            config: CoreConfig {
                db_path,
                bind_addr: "127.0.0.1:0".to_string(),
                admin_token: None,
                assist_model: None,
                assist_enabled,
            },
            db,
            pool,
            resolver,
            migrations,
            bridge,
        })
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/v1/assist/score", post(score))
            .route("/api/v1/assist/subtasks", post(subtasks))
            .route("/api/v1/assist/group-emoji", post(group_emoji))
            .with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> serde_json::Value {
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .header("x-user-id", "u-test")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "assist must never error the request");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn no_credential_score_falls_back_to_neutral() {
        let state = temp_state(true, AssistBridge::new());
        let v = post_json(app(state), "/api/v1/assist/score", r#"{"title":"write report"}"#).await;
        assert_eq!(v["score"], FALLBACK_SCORE);
        assert_eq!(v["source"], "fallback");
    }

    #[tokio::test]
    async fn no_credential_subtasks_fall_back_to_empty() {
        let state = temp_state(true, AssistBridge::new());
        let v = post_json(app(state), "/api/v1/assist/subtasks", r#"{"title":"plan trip"}"#).await;
        assert_eq!(v["subtasks"], serde_json::json!([]));
        assert_eq!(v["source"], "fallback");
    }

    #[tokio::test]
    async fn no_credential_emoji_falls_back_to_folder() {
        let state = temp_state(true, AssistBridge::new());
        let v = post_json(app(state), "/api/v1/assist/group-emoji", r#"{"name":"errands"}"#).await;
        assert_eq!(v["emoji"], FALLBACK_GROUP_EMOJI);
        assert_eq!(v["source"], "fallback");
    }

    #[tokio::test]
    async fn unreachable_upstream_falls_back_and_still_spends_the_reservation() {
        // Credential resolves (pooled), but the upstream refuses the
        // connection; the handler degrades instead of erroring and the
        // usage tick stays spent.
        let bridge = AssistBridge::new().with_api_base("http://127.0.0.1:1");
        let state = temp_state(true, bridge);
        state.pool.insert_key("sk-shared").unwrap();

        let v = post_json(state_app(&state), "/api/v1/assist/score", r#"{"title":"x"}"#).await;
        assert_eq!(v["score"], FALLBACK_SCORE);
        assert_eq!(v["source"], "fallback");

        let usage: u64 = state.pool.list_keys().unwrap().iter().map(|k| k.usage_count).sum();
        assert_eq!(usage, 1, "failed upstream call must not roll the tick back");
    }

    #[tokio::test]
    async fn disabled_assist_falls_back_without_touching_the_pool() {
        let state = temp_state(false, AssistBridge::new());
        state.pool.insert_key("sk-shared").unwrap();

        let v = post_json(state_app(&state), "/api/v1/assist/score", r#"{"title":"x"}"#).await;
        assert_eq!(v["score"], FALLBACK_SCORE);
        assert_eq!(v["source"], "fallback");

        let usage: u64 = state.pool.list_keys().unwrap().iter().map(|k| k.usage_count).sum();
        assert_eq!(usage, 0, "disabled assist must not consume pool quota");
    }

    fn state_app(state: &Arc<AppState>) -> Router {
        app(Arc::clone(state))
    }
}
