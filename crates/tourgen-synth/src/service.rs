//! Synthesis service seam.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tourgen_models::SceneId;

use crate::error::SynthResult;
use crate::types::{OperationOutput, VideoReference};

/// What to render for one AI-synthesis scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub scene_id: SceneId,
    /// Still the clip is generated from
    pub image: PathBuf,
    /// Final frame of the previous clip, when continuity is wanted
    pub continuation_frame: Option<PathBuf>,
    /// Natural-language camera-motion prompt
    pub prompt: String,
    /// Scene duration in seconds
    pub duration: f64,
}

impl RenderRequest {
    pub fn new(scene_id: SceneId, image: impl Into<PathBuf>, prompt: impl Into<String>, duration: f64) -> Self {
        Self {
            scene_id,
            image: image.into(),
            continuation_frame: None,
            prompt: prompt.into(),
            duration,
        }
    }

    pub fn with_continuation(mut self, frame: Option<PathBuf>) -> Self {
        self.continuation_frame = frame;
        self
    }
}

/// Name of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One status check.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Pending,
    Succeeded(OperationOutput),
    Failed { code: Option<i64>, message: String },
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Succeeded(_) => "done",
            OperationStatus::Failed { .. } => "failed",
        }
    }
}

/// External video-synthesis service.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    /// Start a generation; returns as soon as the service has accepted it.
    async fn submit(&self, request: &RenderRequest) -> SynthResult<OperationHandle>;

    /// Check on a generation.
    async fn poll(&self, handle: &OperationHandle) -> SynthResult<OperationStatus>;

    /// Download a finished clip to `dest`.
    async fn fetch(&self, reference: &VideoReference, dest: &Path) -> SynthResult<()>;
}
