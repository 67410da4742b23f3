//! End-to-end tour generation.
//!
//! Plan → render each scene in order → assemble the timeline → branding.
//! Progress is published through the job's [`StatusReporter`]: planning at
//! 5%, scene rendering spread over 10-80%, assembly at 85%, branding at 95%.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::Instrument;

use tourgen_media::{AssemblyReport, FfmpegRunner, ScratchDir, TimelineAssembler};
use tourgen_models::{JobId, ScenePlan, Technique, TourRequest, VideoSegment};
use tourgen_planner::{plan_tour, validate_plan, PlanWarning};
use tourgen_synth::{RenderJobController, SynthConfig, SynthesisService};

use crate::branding::{BrandingCompositor, PassthroughBranding};
use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::limiter::RenderLimiter;
use crate::logging::JobLogger;
use crate::renderer::SceneRenderer;
use crate::status::{JobStatusStore, StatusReporter};

const PROGRESS_PLANNING: u8 = 5;
const PROGRESS_RENDER_START: u8 = 10;
const PROGRESS_RENDER_END: u8 = 80;
const PROGRESS_ASSEMBLING: u8 = 85;
const PROGRESS_BRANDING: u8 = 95;

/// Progress after `done` of `total` scenes have been rendered.
pub fn render_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_RENDER_END;
    }
    let span = (PROGRESS_RENDER_END - PROGRESS_RENDER_START) as usize;
    PROGRESS_RENDER_START + (span * done.min(total) / total) as u8
}

/// What a finished generation produced.
#[derive(Debug, Clone)]
pub struct TourOutcome {
    pub job_id: JobId,
    pub output: PathBuf,
    pub plan: ScenePlan,
    pub warnings: Vec<PlanWarning>,
    pub report: AssemblyReport,
}

pub struct TourGenerator {
    config: WorkerConfig,
    renderer: SceneRenderer,
    assembler: TimelineAssembler,
    branding: Arc<dyn BrandingCompositor>,
    store: Arc<dyn JobStatusStore>,
}

impl TourGenerator {
    /// Create a generator. Without a synthesis service every scene is rendered with pan-zoom.
    pub fn new(
        config: WorkerConfig,
        synthesis: Option<(Arc<dyn SynthesisService>, SynthConfig)>,
        store: Arc<dyn JobStatusStore>,
    ) -> Self {
        let runner = match config.ffmpeg_timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        };

        let mut renderer = SceneRenderer::new(
            config.profile.clone(),
            RenderLimiter::new(config.max_concurrent_renders),
        )
        .with_runner(runner.clone());

        if let Some((service, synth_config)) = synthesis {
            let controller = RenderJobController::new(service, synth_config.poll, synth_config.retry)
                .with_runner(runner.clone());
            renderer = renderer.with_synthesis(Arc::new(controller));
        }

        let assembler = TimelineAssembler::new(config.timeline_options(), config.work_dir.clone())
            .with_runner(runner);

        Self {
            config,
            renderer,
            assembler,
            branding: Arc::new(PassthroughBranding),
            store,
        }
    }

    pub fn with_branding(mut self, branding: Arc<dyn BrandingCompositor>) -> Self {
        self.branding = branding;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn JobStatusStore> {
        &self.store
    }

    /// Generate the tour described by `request`.
    ///
    /// The job's status ends as `completed` or `failed`; on failure the error
    /// is also returned.
    pub async fn generate(&self, request: &TourRequest) -> WorkerResult<TourOutcome> {
        let logger = JobLogger::new(&request.id, "tour_generation");
        let mut reporter = StatusReporter::start(Arc::clone(&self.store), request.id.clone()).await;

        logger.log_start(&format!(
            "{} images, {} audio tracks, target {:.1}s",
            request.images.len(),
            request.audio_tracks.len(),
            request.target_seconds
        ));

        let result = self
            .run(request, &logger, &mut reporter)
            .instrument(logger.create_span())
            .await;

        match &result {
            Ok(outcome) => {
                reporter.complete(outcome.output.display().to_string()).await;
                logger.log_completion(&format!(
                    "{} scenes, {:.1}s, {}",
                    outcome.plan.len(),
                    outcome.report.duration,
                    outcome.output.display()
                ));
            }
            Err(e) => {
                reporter.fail(e.to_string()).await;
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn run(
        &self,
        request: &TourRequest,
        logger: &JobLogger,
        reporter: &mut StatusReporter,
    ) -> WorkerResult<TourOutcome> {
        // Planning
        reporter
            .advance("planning", PROGRESS_PLANNING, "Planning scenes")
            .await;
        let options = self.config.planner_options(request.target_seconds);
        let plan = plan_tour(&request.images, &options)?;
        let warnings = validate_plan(&plan, &options);
        for warning in &warnings {
            logger.log_warning(&warning.to_string());
        }
        logger.log_progress(&format!(
            "Planned {} scenes ({} AI, {} pan-zoom), {:.1}s",
            plan.len(),
            plan.ai_synthesis_count,
            plan.pan_zoom_count,
            plan.total_duration
        ));

        let scratch = ScratchDir::create(&self.config.work_dir, &format!("tour-{}", request.id)).await?;

        // Rendering, strictly in plan order
        let total = plan.len();
        let mut segments: Vec<VideoSegment> = Vec::with_capacity(total);
        let mut previous: Option<(tourgen_models::Room, PathBuf)> = None;

        for (index, scene) in plan.scenes.iter().enumerate() {
            reporter
                .advance(
                    "rendering",
                    render_progress(index, total),
                    format!(
                        "Rendering scene {}/{} ({}, {})",
                        index + 1,
                        total,
                        scene.room.display_name(),
                        scene.technique
                    ),
                )
                .await;

            // Only sub-scenes of the same room continue from the previous clip
            let continuation = match (&previous, self.renderer.effective_technique(scene)) {
                (Some((room, frame)), Technique::AiSynthesis) if *room == scene.room => Some(frame.as_path()),
                _ => None,
            };

            let rendered = self.renderer.render(scene, continuation, scratch.path()).await?;
            logger.log_scene(&scene.id, &format!("rendered {:.2}s", rendered.segment.duration));

            previous = rendered.last_frame.map(|frame| (scene.room, frame));
            segments.push(rendered.segment);
        }

        // Assembly
        reporter
            .advance("assembling", PROGRESS_ASSEMBLING, "Assembling timeline")
            .await;
        let assembled = scratch.join("assembled.mp4");
        let report = self
            .assembler
            .assemble(&segments, &request.audio_tracks, &assembled)
            .await?;

        // Branding
        reporter
            .advance("branding", PROGRESS_BRANDING, "Applying branding")
            .await;
        self.branding
            .compose(&assembled, &plan, request.title.as_deref(), &request.output_path)
            .await?;

        Ok(TourOutcome {
            job_id: request.id.clone(),
            output: request.output_path.clone(),
            plan,
            warnings,
            report,
        })
    }
}
