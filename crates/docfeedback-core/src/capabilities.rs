//! Service capability detection and mode classification.

use serde::{Deserialize, Serialize};

use crate::config::FeedbackConfig;

/// Which document source a submission runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Fabricated sample document, writes are only recorded.
    Demo,
    /// Live Google Docs / Drive APIs.
    Live,
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Demo => write!(f, "demo"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// What the running process can reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCapabilities {
    /// A Google API credential is configured.
    #[serde(rename = "docsApi")]
    pub docs_api: bool,
    /// An LLM provider key is configured.
    pub llm: bool,
    /// Determined mode.
    pub mode: ServiceMode,
}

impl ServiceCapabilities {
    /// Derive capabilities from configuration and LLM provider resolution.
    pub fn discover(config: &FeedbackConfig, llm_configured: bool) -> Self {
        let docs_api = config.has_google_credentials();
        Self {
            docs_api,
            llm: llm_configured,
            mode: Self::determine_mode(docs_api),
        }
    }

    fn determine_mode(docs_api: bool) -> ServiceMode {
        if docs_api {
            ServiceMode::Live
        } else {
            ServiceMode::Demo
        }
    }

    /// A submission can produce feedback at all.
    pub fn can_generate(&self) -> bool {
        self.llm
    }
}
