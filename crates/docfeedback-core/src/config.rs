//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_DOCS_API_BASE: &str = "https://docs.googleapis.com";
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com";
pub const DEFAULT_WRITE_DELAY_MS: u64 = 1000;
pub const DEFAULT_GENERATION_DELAY_MS: u64 = 1000;
pub const DEFAULT_COMMENT_MAX_CHARS: usize = 1800;
pub const DEFAULT_MIN_SEGMENT_CHARS: usize = 50;

/// Paths to the data directory and the files kept in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the root if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            llm_config_file: root.join("llm-config.json"),
            root,
        })
    }
}

/// Top-level docfeedback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Service account key: the JSON text, or a path to the JSON file.
    #[serde(skip_serializing)]
    pub google_service_account: Option<String>,
    /// Fixed OAuth bearer token, used when no service account is set.
    #[serde(skip_serializing)]
    pub google_access_token: Option<String>,
    /// Docs API base URL.
    pub docs_api_base: String,
    /// Drive API base URL (comments).
    pub drive_api_base: String,
    /// Pause between successive comment writes.
    pub write_delay_ms: u64,
    /// Pause between successive per-segment LLM calls.
    pub generation_delay_ms: u64,
    /// Ceiling on the body of a single comment, in characters.
    pub comment_max_chars: usize,
    /// Segments shorter than this (trimmed, in characters) get no feedback of their own.
    pub min_segment_chars: usize,
}

impl FeedbackConfig {
    /// Configuration with built-in defaults and no credentials.
    pub fn with_defaults(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            port: DEFAULT_PORT,
            data_paths: DataPaths::new(data_dir)?,
            google_service_account: None,
            google_access_token: None,
            docs_api_base: DEFAULT_DOCS_API_BASE.into(),
            drive_api_base: DEFAULT_DRIVE_API_BASE.into(),
            write_delay_ms: DEFAULT_WRITE_DELAY_MS,
            generation_delay_ms: DEFAULT_GENERATION_DELAY_MS,
            comment_max_chars: DEFAULT_COMMENT_MAX_CHARS,
            min_segment_chars: DEFAULT_MIN_SEGMENT_CHARS,
        })
    }

    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut config = Self::with_defaults(data_dir)?;

        if let Some(port) = env_parse("PORT") {
            config.port = port;
        }
        config.google_service_account = env_non_empty("GOOGLE_SERVICE_ACCOUNT");
        config.google_access_token = env_non_empty("GOOGLE_ACCESS_TOKEN");
        if let Ok(base) = std::env::var("GOOGLE_DOCS_API_BASE") {
            config.docs_api_base = base;
        }
        if let Ok(base) = std::env::var("GOOGLE_DRIVE_API_BASE") {
            config.drive_api_base = base;
        }
        if let Some(ms) = env_parse("DOCFEEDBACK_WRITE_DELAY_MS") {
            config.write_delay_ms = ms;
        }
        if let Some(ms) = env_parse("DOCFEEDBACK_GENERATION_DELAY_MS") {
            config.generation_delay_ms = ms;
        }
        if let Some(n) = env_parse::<usize>("DOCFEEDBACK_COMMENT_MAX_CHARS") {
            config.comment_max_chars = n.max(1);
        }
        if let Some(n) = env_parse("DOCFEEDBACK_MIN_SEGMENT_CHARS") {
            config.min_segment_chars = n;
        }

        Ok(config)
    }

    /// Some Google credential is configured. Without one the demo source is used.
    pub fn has_google_credentials(&self) -> bool {
        self.google_service_account.is_some() || self.google_access_token.is_some()
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FeedbackConfig::with_defaults(dir.path()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.min_segment_chars, 50);
        assert_eq!(config.comment_max_chars, 1800);
        assert!(config.google_access_token.is_none());
        assert!(!config.has_google_credentials());
        assert_eq!(config.write_delay(), Duration::from_secs(1));
        assert_eq!(
            config.data_paths.llm_config_file,
            dir.path().join("llm-config.json")
        );
    }

    #[test]
    fn test_data_paths_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        let paths = DataPaths::new(&root).unwrap();
        assert!(paths.root.is_dir());
    }

    #[test]
    fn test_token_is_not_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FeedbackConfig::with_defaults(dir.path()).unwrap();
        config.google_access_token = Some("secret-token".into());
        config.google_service_account = Some(r#"{"private_key":"-----BEGIN"}"#.into());
        assert!(config.has_google_credentials());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!json.contains("private_key"));
    }
}
