//! Shared application state.

use std::sync::Arc;

use docfeedback_chat::LLMConfig;
use docfeedback_core::{FeedbackConfig, ServiceCapabilities};
use docfeedback_docs::{create_document_service, DocumentService};
use docfeedback_grade::{FeedbackContext, FeedbackGenerator, LlmFeedbackGenerator, PipelineSettings};
use parking_lot::RwLock;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: FeedbackConfig,
    pub llm_config: RwLock<LLMConfig>,
    pub docs: Arc<dyn DocumentService>,
    pub http: reqwest::Client,
    /// Replaces the configured LLM when set.
    generator_override: Option<Arc<dyn FeedbackGenerator>>,
}

impl AppState {
    pub fn new(config: FeedbackConfig) -> Self {
        let http = reqwest::Client::new();
        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
        let docs = create_document_service(&config, http.clone());

        Self {
            config,
            llm_config: RwLock::new(llm_config),
            docs,
            http,
            generator_override: None,
        }
    }

    /// State with explicit collaborators.
    pub fn with_services(
        config: FeedbackConfig,
        llm_config: LLMConfig,
        docs: Arc<dyn DocumentService>,
        generator: Option<Arc<dyn FeedbackGenerator>>,
    ) -> Self {
        Self {
            config,
            llm_config: RwLock::new(llm_config),
            docs,
            http: reqwest::Client::new(),
            generator_override: generator,
        }
    }

    /// Generator for the next submission, built from the current LLM settings.
    pub fn generator(&self) -> Option<Arc<dyn FeedbackGenerator>> {
        if let Some(generator) = &self.generator_override {
            return Some(generator.clone());
        }
        let resolved = self.llm_config.read().resolve_provider()?;
        Some(Arc::new(LlmFeedbackGenerator::new(self.http.clone(), resolved)))
    }

    /// Pipeline context, or `None` when no LLM provider is configured.
    pub fn feedback_context(&self) -> Option<FeedbackContext> {
        let generator = self.generator()?;
        Some(FeedbackContext::new(
            self.docs.clone(),
            generator,
            PipelineSettings::from_config(&self.config),
        ))
    }

    pub fn capabilities(&self) -> ServiceCapabilities {
        let mut caps = ServiceCapabilities::discover(&self.config, self.generator().is_some());
        caps.mode = self.docs.mode();
        caps
    }
}
