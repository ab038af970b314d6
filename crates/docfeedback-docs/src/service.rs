//! The document service seam and its selection.

use std::sync::Arc;

use async_trait::async_trait;
use docfeedback_core::{FeedbackConfig, Result, ServiceMode};
use tracing::{info, warn};

use crate::auth::GoogleCredentials;
use crate::demo::DemoDocumentService;
use crate::google::GoogleDocsClient;
use crate::patch::BatchUpdate;
use crate::types::{DocumentAccess, DocumentHandle};

/// Reads documents and writes feedback back to them.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Whether the backing API can be used at all.
    fn is_available(&self) -> bool;

    /// Which kind of source this is.
    fn mode(&self) -> ServiceMode;

    /// Fetch title, revision and paragraph segments. One shot, no retry.
    async fn read(&self, document_id: &str) -> Result<DocumentHandle>;

    /// Apply a multi-edit batch atomically.
    async fn batch_update(&self, document_id: &str, batch: &BatchUpdate) -> Result<()>;

    /// Attach one comment. Returns the comment ID.
    async fn create_comment(&self, document_id: &str, content: &str) -> Result<String>;

    /// What the configured identity may do with the document. Writes nothing.
    async fn check_access(&self, document_id: &str) -> Result<DocumentAccess>;
}

/// Pick the live Google client when it is usable, otherwise the demo source.
pub fn create_document_service(
    config: &FeedbackConfig,
    client: reqwest::Client,
) -> Arc<dyn DocumentService> {
    match GoogleCredentials::from_config(config) {
        Ok(Some(credentials)) => {
            let google = GoogleDocsClient::new(
                client,
                credentials,
                &config.docs_api_base,
                &config.drive_api_base,
            );
            if google.is_available() {
                info!("Using Google Docs API at {}", config.docs_api_base);
                return Arc::new(google);
            }
            warn!("Google credentials are empty. Using demo document source.");
        }
        Ok(None) => {
            warn!("Google Docs API unavailable (no credentials). Using demo document source.")
        }
        Err(e) => warn!("Google credentials unusable ({}). Using demo document source.", e),
    }

    Arc::new(DemoDocumentService::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let config = FeedbackConfig::with_defaults(dir.path()).unwrap();
        let service = create_document_service(&config, reqwest::Client::new());
        assert_eq!(service.mode(), ServiceMode::Demo);
        assert!(service.is_available());
    }

    #[test]
    fn test_live_with_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FeedbackConfig::with_defaults(dir.path()).unwrap();
        config.google_access_token = Some("ya29.test".into());
        let service = create_document_service(&config, reqwest::Client::new());
        assert_eq!(service.mode(), ServiceMode::Live);
    }

    #[test]
    fn test_bad_service_account_falls_back_to_demo() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FeedbackConfig::with_defaults(dir.path()).unwrap();
        config.google_service_account = Some(dir.path().join("missing.json").display().to_string());
        config.google_access_token = Some("ya29.ignored".into());
        let service = create_document_service(&config, reqwest::Client::new());
        assert_eq!(service.mode(), ServiceMode::Demo);
    }
}
