//! Job status snapshots for progress tracking and polling.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::JobId;

/// Tour job processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TourJobState {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TourJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourJobState::Pending => "pending",
            TourJobState::Processing => "processing",
            TourJobState::Completed => "completed",
            TourJobState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TourJobState::Completed | TourJobState::Failed)
    }
}

impl std::fmt::Display for TourJobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a tour job as seen by status consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TourJobStatus {
    pub id: JobId,
    pub status: TourJobState,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Current pipeline phase (planning, rendering, ...)
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Output path once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TourJobStatus {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: TourJobState::Pending,
            progress: 0,
            phase: "queued".to_string(),
            message: None,
            result: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record progress within a phase; moves a pending job to processing.
    pub fn advance(&mut self, phase: impl Into<String>, progress: u8, message: Option<String>) {
        if !self.is_terminal() {
            self.status = TourJobState::Processing;
        }
        self.phase = phase.into();
        self.progress = progress.min(100);
        self.message = message;
        self.updated_at = Utc::now();
    }

    /// Mark job as completed with its output location.
    pub fn complete(&mut self, result: impl Into<String>) {
        self.status = TourJobState::Completed;
        self.progress = 100;
        self.phase = "completed".to_string();
        self.result = Some(result.into());
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Mark job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TourJobState::Failed;
        self.phase = "failed".to_string();
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }
}
