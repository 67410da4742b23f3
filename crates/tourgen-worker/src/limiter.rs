//! Render concurrency limiter.
//!
//! Every scene render holds a permit for its whole duration, which caps how
//! many generations are in flight against the external service at once.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

#[derive(Debug, Clone)]
pub struct RenderLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl RenderLimiter {
    /// Create a limiter; zero is treated as one.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Wait for a render slot.
    pub async fn acquire(&self) -> WorkerResult<OwnedSemaphorePermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::render_failed("render limiter closed"))?;
        debug!(available = self.available(), "Render slot acquired");
        Ok(permit)
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

impl Default for RenderLimiter {
    fn default() -> Self {
        Self::new(1)
    }
}
