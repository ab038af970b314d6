//! Document access: reference extraction, reading, and feedback delivery.
//!
//! `DocumentService` is the seam between the pipeline and the outside
//! world. `GoogleDocsClient` talks to the Docs and Drive APIs;
//! `DemoDocumentService` fabricates a sample document and records writes.

pub mod auth;
pub mod comments;
pub mod demo;
pub mod google;
pub mod patch;
pub mod reference;
pub mod service;
pub mod types;

pub use auth::GoogleCredentials;
pub use comments::{post_comments, split_comment, CommentChunk, CommentOutcome, CommentRun, CommentState};
pub use demo::{DemoDocumentService, RecordedWrite};
pub use google::GoogleDocsClient;
pub use patch::{build_inline_batch, format_block, BatchUpdate, DocsRequest};
pub use reference::extract_document_id;
pub use service::{create_document_service, DocumentService};
pub use types::*;
