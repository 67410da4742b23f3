//! Worker error types.

use thiserror::Error;

use tourgen_media::MediaError;
use tourgen_planner::PlanError;
use tourgen_synth::SynthError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    #[error("Branding failed: {0}")]
    BrandingFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Synthesis error: {0}")]
    Synth(#[from] SynthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>) -> Self {
        Self::RenderFailed(msg.into())
    }

    pub fn branding_failed(msg: impl Into<String>) -> Self {
        Self::BrandingFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the synthesis service ran out of status checks.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkerError::Synth(SynthError::OperationTimedOut { .. }))
    }

    /// Check if the input was rejected before any work started.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            WorkerError::Plan(_) | WorkerError::Media(MediaError::InvalidParameters(_))
        )
    }
}
