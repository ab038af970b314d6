//! Document access diagnostics.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use docfeedback_core::{Error, ReadFailure};
use docfeedback_docs::extract_document_id;
use tracing::warn;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/documents/{reference}/access", get(check_access))
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidReference(_) => StatusCode::BAD_REQUEST,
        Error::Read {
            kind: ReadFailure::NotFound,
            ..
        } => StatusCode::NOT_FOUND,
        Error::Read {
            kind: ReadFailure::PermissionDenied,
            ..
        } => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// `reference` is a bare ID or a URL-encoded Docs link.
async fn check_access(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Response {
    let result = match extract_document_id(&reference) {
        Ok(id) => state.docs.check_access(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(access) => Json(access).into_response(),
        Err(e) => {
            warn!("Access check for {} failed: {}", reference, e);
            (
                status_for(&e),
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
