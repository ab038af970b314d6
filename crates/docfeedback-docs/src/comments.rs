//! Comment feedback: chunking and paced, sequential delivery.
//!
//! There is no atomicity here. A failure partway leaves the comments that
//! were already posted; the run reports how many items made it.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::service::DocumentService;
use crate::types::FeedbackItem;

/// One comment-sized piece of an item's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentChunk {
    pub label: String,
    /// 1-based position.
    pub index: usize,
    pub total: usize,
    pub body: String,
}

impl CommentChunk {
    /// Text posted as the comment content.
    pub fn render(&self) -> String {
        if self.total > 1 {
            format!(
                "[AI 평가 - {}] (part {}/{})\n{}",
                self.label, self.index, self.total, self.body
            )
        } else {
            format!("[AI 평가 - {}]\n{}", self.label, self.body)
        }
    }
}

/// Split `content` into bodies of at most `max_chars` characters.
pub fn split_comment(label: &str, content: &str, max_chars: usize) -> Vec<CommentChunk> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = content.chars().collect();
    let total = chars.len().div_ceil(max_chars);

    chars
        .chunks(max_chars)
        .enumerate()
        .map(|(i, piece)| CommentChunk {
            label: label.to_string(),
            index: i + 1,
            total,
            body: piece.iter().collect(),
        })
        .collect()
}

/// Delivery state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentOutcome {
    pub label: String,
    pub state: CommentState,
    #[serde(rename = "chunksSent")]
    pub chunks_sent: usize,
    #[serde(rename = "chunksTotal")]
    pub chunks_total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of posting a batch of items as comments.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentRun {
    pub outcomes: Vec<CommentOutcome>,
}

impl CommentRun {
    /// Items whose every chunk was posted.
    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == CommentState::Sent)
            .count()
    }

    /// Items that were attempted.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_deref().map(|e| (o.label.as_str(), e)))
    }
}

/// Post each non-empty item as one or more comments, one call at a time.
///
/// `delay` is slept before every call except the first.
pub async fn post_comments(
    service: &dyn DocumentService,
    document_id: &str,
    items: &[FeedbackItem],
    max_chars: usize,
    delay: Duration,
) -> CommentRun {
    let mut run = CommentRun::default();
    let mut calls = 0usize;

    for item in items.iter().filter(|i| !i.content.trim().is_empty()) {
        let chunks = split_comment(&item.label, item.content.trim(), max_chars);
        let mut outcome = CommentOutcome {
            label: item.label.clone(),
            state: CommentState::Pending,
            chunks_sent: 0,
            chunks_total: chunks.len(),
            error: None,
        };

        for chunk in &chunks {
            if calls > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            calls += 1;

            match service.create_comment(document_id, &chunk.render()).await {
                Ok(comment_id) => {
                    debug!(
                        "Posted comment {} ({} part {}/{})",
                        comment_id, chunk.label, chunk.index, chunk.total
                    );
                    outcome.chunks_sent += 1;
                }
                Err(e) => {
                    warn!("Comment for '{}' failed: {}", item.label, e);
                    outcome.state = CommentState::Failed;
                    outcome.error = Some(e.to_string());
                    break;
                }
            }
        }

        if outcome.state == CommentState::Pending {
            outcome.state = CommentState::Sent;
        }
        run.outcomes.push(outcome);
    }

    info!("Comments posted: {}/{}", run.sent(), run.total());
    run
}
