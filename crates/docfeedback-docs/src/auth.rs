//! Google API credentials.
//!
//! A service account mints its own short-lived tokens and refreshes them as
//! they expire; a fixed token is sent as given.

use std::sync::Arc;

use docfeedback_core::{Error, FeedbackConfig, Result};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;
use tracing::debug;

/// Scopes needed to read documents, edit them and comment on them.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/drive",
];

/// How requests to the Docs and Drive APIs are authorized.
#[derive(Clone)]
pub enum GoogleCredentials {
    /// A bearer token supplied from outside.
    Token(String),
    /// A service account key.
    ServiceAccount {
        account: Arc<CustomServiceAccount>,
        email: Option<String>,
    },
}

#[derive(Deserialize)]
struct KeyIdentity {
    #[serde(default)]
    client_email: Option<String>,
}

impl GoogleCredentials {
    /// Credentials from configuration; the service account wins over a token.
    pub fn from_config(config: &FeedbackConfig) -> Result<Option<Self>> {
        if let Some(key) = &config.google_service_account {
            return Self::service_account(key).map(Some);
        }
        Ok(config.google_access_token.clone().map(Self::Token))
    }

    /// Load a service account key from its JSON text or from a path to the file.
    pub fn service_account(key: &str) -> Result<Self> {
        let json = if key.trim_start().starts_with('{') {
            key.to_string()
        } else {
            std::fs::read_to_string(key.trim())?
        };

        let identity: KeyIdentity = serde_json::from_str(&json)?;
        let account = CustomServiceAccount::from_json(&json)
            .map_err(|e| Error::Config(format!("Invalid service account key: {}", e)))?;

        Ok(Self::ServiceAccount {
            account: Arc::new(account),
            email: identity.client_email,
        })
    }

    pub fn is_usable(&self) -> bool {
        match self {
            Self::Token(token) => !token.trim().is_empty(),
            Self::ServiceAccount { .. } => true,
        }
    }

    /// The identity documents must be shared with, when known.
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::Token(_) => None,
            Self::ServiceAccount { email, .. } => email.as_deref(),
        }
    }

    /// A bearer token valid for [`SCOPES`]. Cached tokens are reused until they expire.
    pub async fn bearer(&self) -> Result<String> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::ServiceAccount { account, .. } => {
                let token = account
                    .token(SCOPES)
                    .await
                    .map_err(|e| Error::Http(format!("Token request failed: {}", e)))?;
                debug!("Using service account token");
                Ok(token.as_str().to_string())
            }
        }
    }
}

impl std::fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("GoogleCredentials::Token(..)"),
            Self::ServiceAccount { email, .. } => f
                .debug_struct("GoogleCredentials::ServiceAccount")
                .field("email", email)
                .finish(),
        }
    }
}
