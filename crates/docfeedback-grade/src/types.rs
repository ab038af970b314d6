//! Submission and report types.

use chrono::{DateTime, Utc};
use docfeedback_core::ServiceMode;
use docfeedback_docs::{CommentRun, DeliveryMode};
use serde::{Deserialize, Serialize};

use crate::rubric::Genre;

/// One teacher submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    /// Docs URL or bare document ID.
    pub reference: String,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default)]
    pub mode: DeliveryMode,
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

impl FeedbackRequest {
    pub fn new(reference: impl Into<String>, genre: Genre, mode: DeliveryMode) -> Self {
        Self {
            reference: reference.into(),
            genre,
            mode,
            custom_instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.custom_instructions = Some(instructions).filter(|s| !s.trim().is_empty());
        self
    }
}

/// Label and content of one generated item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemPreview {
    pub label: String,
    pub content: String,
}

/// Outcome of one submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub submission_id: String,
    pub created_at: DateTime<Utc>,
    pub document_id: String,
    pub title: String,
    pub document_url: String,
    pub genre: Genre,
    pub mode: DeliveryMode,
    pub service_mode: ServiceMode,
    /// Provider and model that produced the feedback.
    pub generator: String,
    /// LLM calls made (overall plus meaningful segments).
    pub scopes_attempted: usize,
    /// LLM calls that returned feedback.
    pub scopes_succeeded: usize,
    pub items_planned: usize,
    pub items_delivered: usize,
    /// One entry per caught failure.
    pub warnings: Vec<String>,
    pub items: Vec<ItemPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<CommentRun>,
}

impl FeedbackReport {
    /// Every planned item reached the document.
    pub fn is_complete(&self) -> bool {
        self.items_planned > 0 && self.items_planned == self.items_delivered
    }
}
