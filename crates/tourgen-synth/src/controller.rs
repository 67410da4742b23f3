//! Render job controller.
//!
//! Runs one AI-synthesis scene from submission to a local clip plus its final
//! frame. Rate limiting is the caller's concern.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn, Instrument};

use tourgen_media::{extract_last_frame, FfmpegRunner};

use crate::error::{SynthError, SynthResult};
use crate::job::{RenderJob, RenderJobState};
use crate::metrics::{record_poll, record_render};
use crate::retry::{with_retry, PollConfig, RetryConfig};
use crate::service::{OperationStatus, RenderRequest, SynthesisService};
use crate::types::VideoReference;

/// A downloaded clip and the frame it ends on.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    pub clip_path: PathBuf,
    pub last_frame_path: PathBuf,
    /// Status checks it took
    pub attempts: u32,
}

pub struct RenderJobController {
    service: Arc<dyn SynthesisService>,
    poll: PollConfig,
    retry: RetryConfig,
    runner: FfmpegRunner,
}

impl RenderJobController {
    pub fn new(service: Arc<dyn SynthesisService>, poll: PollConfig, retry: RetryConfig) -> Self {
        Self {
            service,
            poll,
            retry,
            runner: FfmpegRunner::new(),
        }
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Render a scene into `out_dir` and extract the clip's last frame.
    pub async fn render(&self, request: &RenderRequest, out_dir: &Path) -> SynthResult<RenderedClip> {
        let clip_path = out_dir.join(format!("{}.mp4", request.scene_id));
        let last_frame_path = out_dir.join(format!("{}_last.jpg", request.scene_id));

        let job = self.generate(request, &clip_path).await?;
        extract_last_frame(&clip_path, &last_frame_path, &self.runner).await?;

        Ok(RenderedClip {
            clip_path,
            last_frame_path,
            attempts: job.attempts(),
        })
    }

    /// Submit, poll to completion and download the clip to `dest`.
    pub async fn generate(&self, request: &RenderRequest, dest: &Path) -> SynthResult<RenderJob> {
        let span = info_span!("render_job", scene_id = %request.scene_id);
        let started = Instant::now();

        let result = async {
            let handle = with_retry(&self.retry, "submit", || self.service.submit(request)).await?;
            let mut job = RenderJob::new(request.scene_id.clone(), handle);

            let reference = self.poll_until_done(&mut job).await?;
            self.service.fetch(&reference, dest).await?;

            info!(
                operation = %job.operation(),
                attempts = job.attempts(),
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Clip generated"
            );
            Ok::<_, SynthError>(job)
        }
        .instrument(span)
        .await;

        let outcome = match &result {
            Ok(_) => "done",
            Err(SynthError::OperationTimedOut { .. }) => "timed_out",
            Err(_) => "failed",
        };
        record_render(outcome, started.elapsed().as_secs_f64());
        result
    }

    /// Poll until the operation finishes and return the clip it produced.
    pub(crate) async fn poll_until_done(&self, job: &mut RenderJob) -> SynthResult<VideoReference> {
        let max_attempts = self.poll.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match self.service.poll(job.operation()).await {
                Ok(OperationStatus::Succeeded(output)) => {
                    record_poll("done");
                    // A finished operation without a usable clip fails the job
                    let reference = output.first_reference();
                    match &reference {
                        Ok(_) => {
                            job.observe(OperationStatus::Succeeded(output));
                        }
                        Err(e) => {
                            job.observe_error();
                            job.fail();
                            warn!(operation = %job.operation(), "Operation finished without a clip: {}", e);
                        }
                    }
                    return reference;
                }
                Ok(OperationStatus::Failed { code, message }) => {
                    record_poll("failed");
                    job.observe(OperationStatus::Failed {
                        code,
                        message: message.clone(),
                    });
                    warn!(operation = %job.operation(), code = ?code, "Operation failed: {}", message);
                    return Err(SynthError::OperationFailed { code, message });
                }
                Ok(OperationStatus::Pending) => {
                    record_poll("pending");
                    job.observe(OperationStatus::Pending);
                }
                Err(e) if e.is_transient() => {
                    record_poll("error");
                    job.observe_error();
                    warn!(
                        operation = %job.operation(),
                        attempt = attempt + 1,
                        "Status check failed, will retry: {}",
                        e
                    );
                }
                Err(e) => {
                    record_poll("error");
                    job.fail();
                    return Err(e);
                }
            }

            if attempt + 1 < max_attempts {
                let delay = self.poll.delay(attempt);
                debug!(
                    operation = %job.operation(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Operation not done yet"
                );
                tokio::time::sleep(delay).await;
            }
        }

        job.time_out();
        debug_assert_eq!(job.state(), RenderJobState::TimedOut);
        Err(SynthError::OperationTimedOut {
            attempts: job.attempts(),
        })
    }
}
