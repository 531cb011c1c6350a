//! Error types shared across Jimaku crates.

use std::path::PathBuf;

/// Top-level error type for Jimaku operations.
#[derive(Debug, thiserror::Error)]
pub enum JimakuError {
    /// The edit list could not be turned into output segments.
    #[error("Planning error: {message}")]
    Planning { message: String },

    /// Cue data could not be rendered into an overlay script.
    #[error("Render error: {message}")]
    Render { message: String },

    /// The external encoder is missing, could not be launched, or exited non-zero.
    #[error("Encoder error: {message}")]
    Process { message: String },

    /// A cooperative cancellation request was honored.
    #[error("Export cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using JimakuError.
pub type JimakuResult<T> = Result<T, JimakuError>;

impl JimakuError {
    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Whether this error is the result of a cancellation request rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
