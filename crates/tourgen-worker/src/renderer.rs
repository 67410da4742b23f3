//! Scene rendering dispatch.
//!
//! AI-synthesis scenes go through the render job controller; pan-zoom scenes
//! are rendered locally. Both hold a [`RenderLimiter`] permit while working.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use tourgen_media::{probe_video, render_pan_zoom, FfmpegRunner, PanZoomParams};
use tourgen_models::{OutputProfile, Scene, Technique, VideoSegment};
use tourgen_synth::{RenderJobController, RenderRequest};

use crate::error::{WorkerError, WorkerResult};
use crate::limiter::RenderLimiter;
use crate::prompt::motion_prompt;

/// Rendered scenes by technique.
pub const SCENES_RENDERED_TOTAL: &str = "tourgen_scenes_rendered_total";

/// A rendered scene ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScene {
    pub segment: VideoSegment,
    /// Final frame of an AI clip, offered to the next scene for continuity
    pub last_frame: Option<PathBuf>,
}

/// Timeline duration of a rendered clip: the planned length, never more than the file holds.
pub fn segment_duration(planned: f64, probed: f64) -> f64 {
    if probed.is_finite() && probed > 0.0 {
        planned.min(probed)
    } else {
        planned
    }
}

pub struct SceneRenderer {
    synth: Option<Arc<RenderJobController>>,
    profile: OutputProfile,
    runner: FfmpegRunner,
    limiter: RenderLimiter,
}

impl SceneRenderer {
    pub fn new(profile: OutputProfile, limiter: RenderLimiter) -> Self {
        Self {
            synth: None,
            profile,
            runner: FfmpegRunner::new(),
            limiter,
        }
    }

    /// Enable AI synthesis; without it AI scenes are rendered as pan-zoom.
    pub fn with_synthesis(mut self, controller: Arc<RenderJobController>) -> Self {
        self.synth = Some(controller);
        self
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn limiter(&self) -> &RenderLimiter {
        &self.limiter
    }

    pub fn has_synthesis(&self) -> bool {
        self.synth.is_some()
    }

    /// The technique that will actually be used for `scene`.
    pub fn effective_technique(&self, scene: &Scene) -> Technique {
        match scene.technique {
            Technique::AiSynthesis if self.synth.is_some() => Technique::AiSynthesis,
            _ => Technique::PanZoom,
        }
    }

    /// Render one scene into `out_dir`.
    pub async fn render(
        &self,
        scene: &Scene,
        continuation: Option<&Path>,
        out_dir: &Path,
    ) -> WorkerResult<RenderedScene> {
        let image = scene
            .primary_image()
            .ok_or_else(|| WorkerError::render_failed(format!("scene {} has no images", scene.id)))?;

        let technique = self.effective_technique(scene);
        if technique != scene.technique {
            warn!(
                scene_id = %scene.id,
                "AI synthesis is not configured, rendering with pan-zoom instead"
            );
        }

        let _permit = self.limiter.acquire().await?;

        let (clip_path, last_frame) = match (technique, &self.synth) {
            (Technique::AiSynthesis, Some(controller)) => {
                let request = RenderRequest::new(
                    scene.id.clone(),
                    image.path(),
                    motion_prompt(scene, continuation.is_some()),
                    scene.duration,
                )
                .with_continuation(continuation.map(Path::to_path_buf));

                let clip = controller.render(&request, out_dir).await?;
                (clip.clip_path, Some(clip.last_frame_path))
            }
            _ => {
                let clip_path = out_dir.join(format!("{}.mp4", scene.id));
                let params = PanZoomParams::for_room(scene.room, scene.duration, &self.profile)?;
                render_pan_zoom(image.path(), &clip_path, &params, &self.profile, &self.runner).await?;
                (clip_path, None)
            }
        };

        let info = probe_video(&clip_path).await?;
        let duration = segment_duration(scene.duration, info.duration);

        counter!(SCENES_RENDERED_TOTAL, "technique" => technique.as_str()).increment(1);
        info!(
            scene_id = %scene.id,
            technique = %technique,
            planned = scene.duration,
            probed = info.duration,
            "Scene rendered"
        );

        Ok(RenderedScene {
            segment: VideoSegment {
                scene_id: scene.id.clone(),
                path: clip_path,
                duration,
                technique,
                room: scene.room,
                has_audio: info.has_audio,
            },
            last_frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourgen_models::{ImageDescriptor, Room, SceneId};

    fn scene(technique: Technique, images: Vec<ImageDescriptor>) -> Scene {
        Scene {
            id: SceneId::for_room(Room::Living, 1),
            room: Room::Living,
            images,
            duration: 5.0,
            technique,
            description: String::new(),
            focus_points: Vec::new(),
            is_filler: false,
        }
    }

    #[test]
    fn test_segment_duration() {
        assert_eq!(segment_duration(5.5, 8.0), 5.5);
        assert_eq!(segment_duration(6.0, 5.96), 5.96);
        assert_eq!(segment_duration(6.0, 0.0), 6.0);
        assert_eq!(segment_duration(6.0, f64::NAN), 6.0);
    }

    #[test]
    fn test_ai_falls_back_without_synthesis() {
        let renderer = SceneRenderer::new(OutputProfile::default(), RenderLimiter::default());
        assert!(!renderer.has_synthesis());
        let ai = scene(Technique::AiSynthesis, vec![ImageDescriptor::new("l.jpg")]);
        assert_eq!(renderer.effective_technique(&ai), Technique::PanZoom);
    }

    #[tokio::test]
    async fn test_scene_without_images_fails_before_rendering() {
        let renderer = SceneRenderer::new(OutputProfile::default(), RenderLimiter::default());
        let empty = scene(Technique::PanZoom, Vec::new());
        let err = renderer
            .render(&empty, None, Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::RenderFailed(_)));
        assert_eq!(renderer.limiter().available(), 1);
    }
}
