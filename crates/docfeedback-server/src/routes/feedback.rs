//! Feedback submission: runs the grading pipeline for one document.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use docfeedback_core::Error;
use docfeedback_docs::{extract_document_id, DeliveryMode};
use docfeedback_grade::{FeedbackRequest, Genre};
use serde::Deserialize;
use tracing::{error, info};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/feedback", post(submit_feedback))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitFeedback {
    document_url: String,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    custom_instructions: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// HTTP status for a failure that aborted the pipeline.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidReference(_) | Error::UnknownGenre(_) => StatusCode::BAD_REQUEST,
        Error::Read { .. } | Error::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitFeedback>,
) -> Response {
    let genre = match req.genre.as_deref().map(str::parse::<Genre>).transpose() {
        Ok(genre) => genre.unwrap_or_default(),
        Err(e) => return error_response(status_for(&e), e.to_string()),
    };
    let mode = match req.mode.as_deref().map(str::parse::<DeliveryMode>).transpose() {
        Ok(mode) => mode.unwrap_or_default(),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    if let Err(e) = extract_document_id(&req.document_url) {
        return error_response(status_for(&e), e.to_string());
    }

    let Some(context) = state.feedback_context() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "No LLM provider configured");
    };

    let mut request = FeedbackRequest::new(req.document_url, genre, mode);
    if let Some(instructions) = req.custom_instructions {
        request = request.with_instructions(instructions);
    }

    match context.run(&request).await {
        Ok(report) => {
            info!(
                "Submission {} delivered {}/{} items",
                report.submission_id, report.items_delivered, report.items_planned
            );
            Json(report).into_response()
        }
        Err(e) => {
            error!("Feedback run failed: {}", e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfeedback_core::ReadFailure;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::InvalidReference("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::UnknownGenre("시".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::read(ReadFailure::PermissionDenied, "403")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Config("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
