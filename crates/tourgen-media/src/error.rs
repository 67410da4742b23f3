//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Timeline assembly failed at {stage}: {message}")]
    Assembly {
        stage: String,
        message: String,
        diagnostic: Option<String>,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid filter graph: {0}")]
    InvalidFilterGraph(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }

    pub fn invalid_filter_graph(message: impl Into<String>) -> Self {
        Self::InvalidFilterGraph(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Attribute a failure to an assembly stage, keeping FFmpeg's stderr as the diagnostic.
    pub fn at_stage(self, stage: impl Into<String>) -> Self {
        let stage = stage.into();
        match self {
            MediaError::FfmpegFailed {
                message, stderr, ..
            } => MediaError::Assembly {
                stage,
                message,
                diagnostic: stderr,
            },
            MediaError::Assembly { .. }
            | MediaError::InvalidParameters(_)
            | MediaError::InvalidFilterGraph(_)
            | MediaError::FileNotFound(_) => self,
            other => MediaError::Assembly {
                stage,
                message: other.to_string(),
                diagnostic: None,
            },
        }
    }

    /// Diagnostic text captured from the external tool, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { stderr, .. } | MediaError::FfprobeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            MediaError::Assembly { diagnostic, .. } => diagnostic.as_deref(),
            _ => None,
        }
    }
}
