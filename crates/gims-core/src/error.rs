//! Error taxonomy shared by every GIMS client.
//!
//! Callers branch on [`GimsError::is_not_found`] to pick create-vs-update
//! paths; everything else is surfaced to the user through [`GimsError::envelope`].

use std::path::PathBuf;

use serde_json::{Value, json};
use thiserror::Error;

pub type Result<T, E = GimsError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GimsError {
    /// Missing or malformed credentials / URL. Never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structured error returned by the remote API (4xx/5xx).
    #[error("GIMS API Error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    /// The server answered with something that is not the expected JSON.
    #[error("Invalid response format ({status}): {detail}")]
    Protocol { status: u16, detail: String },

    /// Network-level failure (connect, read, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A lookup by name (or other local resolution) found nothing.
    #[error("{0}")]
    NotFound(String),

    /// Local source failed validation; no remote call was made.
    #[error("{message}")]
    Validation {
        message: String,
        detail: Option<String>,
    },

    /// Bad command input (empty patch, invalid pattern, missing selector).
    #[error("{0}")]
    InvalidInput(String),

    #[error("Folder hierarchy contains a cycle through folder {folder_id}")]
    FolderCycle { folder_id: i64 },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local file exists but could not be parsed.
    #[error("Failed to parse {}: {detail}", path.display())]
    Format { path: PathBuf, detail: String },
}

impl GimsError {
    pub fn api(status: u16, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>, detail: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            detail,
        }
    }

    /// True when the target does not exist (yet), either remotely or by name.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { status: 404, .. })
    }

    /// HTTP status carried by the error, 0 for local failures.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Api { status, .. } | Self::Protocol { status, .. } => *status,
            Self::NotFound(_) => 404,
            _ => 0,
        }
    }

    /// Short human-readable message without the detail.
    pub fn message(&self) -> String {
        match self {
            Self::Config(_) => "Configuration error".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Protocol { .. } => "Invalid response format".to_string(),
            Self::Transport(_) => "Connection error".to_string(),
            Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Config(detail) | Self::Transport(detail) => Some(detail.clone()),
            Self::Api { detail, .. } | Self::Validation { detail, .. } => detail.clone(),
            Self::Protocol { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }

    /// JSON error envelope emitted by the sync commands.
    pub fn envelope(&self) -> Value {
        json!({
            "status": "error",
            "message": self.message(),
            "detail": self.detail(),
        })
    }
}
