use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by discovery and run providers.
///
/// Payloads are plain strings so the error can be cloned to every caller
/// sharing one in-flight discovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Failed to launch test runner: {0}")]
    Launch(String),

    #[error("IO error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse runner output: {0}")]
    Parse(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProviderError::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
