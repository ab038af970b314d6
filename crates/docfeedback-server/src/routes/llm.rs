//! LLM provider settings.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docfeedback_chat::providers;
use docfeedback_chat::types::{LLMConfigResponse, LLMConfigUpdate, TestKeyRequest};
use tracing::{info, warn};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/llm/config", get(get_config).put(update_config))
        .route("/llm/config/test", post(test_key))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<LLMConfigResponse> {
    Json(state.llm_config.read().to_response())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LLMConfigUpdate>,
) -> Response {
    let mut config = state.llm_config.write();
    config.apply_update(&update);

    if let Err(e) = config.save() {
        warn!("Failed to save LLM config: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("Failed to save config: {}", e) })),
        )
            .into_response();
    }

    info!("LLM provider preference is now '{}'", config.preferred_provider);
    Json(config.to_response()).into_response()
}

async fn test_key(Json(req): Json<TestKeyRequest>) -> Json<serde_json::Value> {
    match providers::test_api_key(&req.provider, &req.api_key).await {
        Ok(()) => Json(serde_json::json!({ "success": true })),
        Err(e) => Json(serde_json::json!({ "success": false, "error": e })),
    }
}
