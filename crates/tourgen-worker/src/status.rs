//! Job status store and progress reporting.
//!
//! Each job's status is written only by the job's own task through a
//! [`StatusReporter`]; any number of readers take snapshots from the store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use tourgen_models::{JobId, TourJobStatus};

/// Where job status snapshots are kept.
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    async fn get(&self, id: &JobId) -> Option<TourJobStatus>;

    /// Replace the stored snapshot for `status.id`.
    async fn set(&self, status: TourJobStatus);

    /// All known jobs, most recently updated first.
    async fn list(&self) -> Vec<TourJobStatus>;
}

/// Process-local status store.
#[derive(Debug, Default)]
pub struct InMemoryJobStatusStore {
    jobs: RwLock<HashMap<JobId, TourJobStatus>>,
}

impl InMemoryJobStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStatusStore for InMemoryJobStatusStore {
    async fn get(&self, id: &JobId) -> Option<TourJobStatus> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn set(&self, status: TourJobStatus) {
        self.jobs.write().await.insert(status.id.clone(), status);
    }

    async fn list(&self) -> Vec<TourJobStatus> {
        let mut jobs: Vec<TourJobStatus> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        jobs
    }
}

/// The single writer for one job's status.
pub struct StatusReporter {
    store: Arc<dyn JobStatusStore>,
    status: TourJobStatus,
}

impl StatusReporter {
    /// Register the job as pending.
    pub async fn start(store: Arc<dyn JobStatusStore>, id: JobId) -> Self {
        let status = TourJobStatus::new(id);
        store.set(status.clone()).await;
        Self { store, status }
    }

    pub fn current(&self) -> &TourJobStatus {
        &self.status
    }

    /// Publish progress within a phase.
    pub async fn advance(&mut self, phase: &str, progress: u8, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status.advance(phase, progress, Some(message.into()));
        debug!(
            job_id = %self.status.id,
            phase = %phase,
            progress = self.status.progress,
            "Job status updated"
        );
        self.store.set(self.status.clone()).await;
    }

    pub async fn complete(&mut self, result: impl Into<String>) {
        self.status.complete(result);
        self.store.set(self.status.clone()).await;
    }

    pub async fn fail(&mut self, error: impl Into<String>) {
        self.status.fail(error);
        self.store.set(self.status.clone()).await;
    }
}
