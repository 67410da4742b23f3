//! Branding hand-off.
//!
//! Overlays (room labels, logo, end slate) are composited outside this
//! workspace. The generator hands the assembled video and the plan to a
//! [`BrandingCompositor`] and expects the final file at `output`.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use tourgen_media::place_output;
use tourgen_models::ScenePlan;

use crate::error::WorkerResult;

#[async_trait]
pub trait BrandingCompositor: Send + Sync {
    /// Produce the branded tour at `output` from the assembled `video`.
    ///
    /// `plan` gives room labels and per-scene timing for overlay placement.
    async fn compose(&self, video: &Path, plan: &ScenePlan, title: Option<&str>, output: &Path) -> WorkerResult<()>;
}

/// Moves the assembled video into place unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughBranding;

#[async_trait]
impl BrandingCompositor for PassthroughBranding {
    async fn compose(&self, video: &Path, plan: &ScenePlan, title: Option<&str>, output: &Path) -> WorkerResult<()> {
        debug!(
            scenes = plan.len(),
            title = title.unwrap_or_default(),
            "No branding configured, passing video through"
        );
        place_output(video, output).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_passthrough_moves_video() {
        let dir = TempDir::new().unwrap();
        let assembled = dir.path().join("assembled.mp4");
        std::fs::write(&assembled, b"video").unwrap();
        let output = dir.path().join("out").join("tour.mp4");

        let plan = ScenePlan::from_scenes(Vec::new(), 60.0, 57.0);
        PassthroughBranding
            .compose(&assembled, &plan, Some("12 Elm Street"), &output)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"video");
        assert!(!assembled.exists());
    }
}
