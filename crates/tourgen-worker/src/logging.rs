//! Structured job logging utilities.

use tracing::{error, info, warn, Span};

use tourgen_models::{JobId, SceneId};

/// Job-scoped lifecycle logging with consistent fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a logger for a job and operation (e.g. "tour_generation").
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log progress on a single scene.
    pub fn log_scene(&self, scene_id: &SceneId, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            scene_id = %scene_id,
            "Scene: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the job fields, for instrumenting the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
