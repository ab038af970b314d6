//! Error types for docfeedback.

use serde::Serialize;
use thiserror::Error;

/// Why a document read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFailure {
    NotFound,
    PermissionDenied,
    Transient,
}

impl std::fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Transient => write!(f, "transient"),
        }
    }
}

/// Why a document write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailure {
    PermissionDenied,
    TooLong,
    Failed,
}

impl std::fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::TooLong => write!(f, "content too long"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid document reference: {0}")]
    InvalidReference(String),

    #[error("Document read failed ({kind}): {message}")]
    Read { kind: ReadFailure, message: String },

    #[error("Feedback generation failed: {0}")]
    Generation(String),

    #[error("Document write failed ({kind}): {message}")]
    Write { kind: WriteFailure, message: String },

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    pub fn read(kind: ReadFailure, message: impl Into<String>) -> Self {
        Self::Read {
            kind,
            message: message.into(),
        }
    }

    pub fn write(kind: WriteFailure, message: impl Into<String>) -> Self {
        Self::Write {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
