//! The feedback generator seam.

use async_trait::async_trait;
use docfeedback_chat::config::ResolvedProvider;
use docfeedback_chat::providers;
use docfeedback_core::Result;
use reqwest::Client;
use tracing::debug;

use crate::prompt::PromptSpec;

/// Turns one prompt into one piece of feedback text.
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Longest text, in characters, embedded into one prompt.
    fn max_input_chars(&self) -> usize;

    /// Provider and model, for reporting.
    fn describe(&self) -> String;

    /// Call the model once. No retry.
    async fn generate(&self, prompt: &PromptSpec) -> Result<String>;
}

/// Generator backed by the configured OpenAI or Anthropic account.
pub struct LlmFeedbackGenerator {
    client: Client,
    resolved: ResolvedProvider,
}

impl LlmFeedbackGenerator {
    pub fn new(client: Client, resolved: ResolvedProvider) -> Self {
        Self { client, resolved }
    }
}

#[async_trait]
impl FeedbackGenerator for LlmFeedbackGenerator {
    fn max_input_chars(&self) -> usize {
        self.resolved.provider.max_input_chars()
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.resolved.provider, self.resolved.model)
    }

    async fn generate(&self, prompt: &PromptSpec) -> Result<String> {
        let completion = providers::complete(
            &self.client,
            self.resolved.provider,
            prompt.messages(),
            &self.resolved.model,
            &self.resolved.api_key,
            prompt.temperature,
            prompt.max_tokens,
        )
        .await?;

        debug!(
            "{} returned {} chars ({} tokens)",
            self.describe(),
            completion.text.len(),
            completion.tokens_used
        );
        Ok(completion.text)
    }
}
