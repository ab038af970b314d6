//! Service status, genre catalogue and reference extraction.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docfeedback_docs::extract_document_id;
use docfeedback_grade::{GenreRubric, GENRES};
use serde::Deserialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/genres", get(list_genres))
        .route("/extract-id", post(extract_id))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let caps = state.capabilities();
    let llm = state.llm_config.read();
    let resolved = llm.resolve_provider();

    Json(serde_json::json!({
        "mode": caps.mode,
        "docsApi": caps.docs_api,
        "llmAvailable": caps.llm,
        "llmProvider": resolved.as_ref().map(|r| r.provider.to_string()),
        "llmModel": resolved.as_ref().map(|r| r.model.clone()),
        "availableModels": llm.available_models(),
        "genres": GENRES.len(),
        "deliveryModes": ["inline", "comment"],
    }))
}

async fn list_genres() -> Json<&'static [GenreRubric]> {
    Json(GENRES)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractIdRequest {
    document_url: String,
}

async fn extract_id(Json(req): Json<ExtractIdRequest>) -> Response {
    match extract_document_id(&req.document_url) {
        Ok(id) => Json(serde_json::json!({ "documentId": id })).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
