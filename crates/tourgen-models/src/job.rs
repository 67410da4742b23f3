//! Tour job requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::{AudioTrack, ImageDescriptor};

/// Unique identifier for a tour generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to generate one tour.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TourRequest {
    /// Job identifier; generated when absent
    #[serde(default)]
    pub id: JobId,

    pub images: Vec<ImageDescriptor>,

    /// Narration and music produced by the audio stage
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,

    /// Desired tour length in seconds
    #[serde(default = "default_target_seconds")]
    pub target_seconds: f64,

    /// Where the finished tour is written
    pub output_path: PathBuf,

    /// Listing title passed on to branding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_target_seconds() -> f64 {
    60.0
}

impl TourRequest {
    pub fn new(images: Vec<ImageDescriptor>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            id: JobId::new(),
            images,
            audio_tracks: Vec::new(),
            target_seconds: default_target_seconds(),
            output_path: output_path.into(),
            title: None,
        }
    }

    pub fn with_target_seconds(mut self, target_seconds: f64) -> Self {
        self.target_seconds = target_seconds;
        self
    }

    pub fn with_audio_tracks(mut self, audio_tracks: Vec<AudioTrack>) -> Self {
        self.audio_tracks = audio_tracks;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioKind, Room};

    #[test]
    fn test_job_id_unique() {
        assert_ne!(JobId::new(), JobId::new());
        assert_eq!(JobId::from_string("abc").to_string(), "abc");
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "images": [{"path": "a.jpg", "room": "exterior"}, {"path": "b.jpg"}],
            "audio_tracks": [{"path": "vo.mp3", "kind": "voiceover", "start_time": 1.5}],
            "target_seconds": 45,
            "output_path": "/out/tour.mp4"
        }"#;
        let request: TourRequest = serde_json::from_str(json).unwrap();

        assert!(!request.id.as_str().is_empty());
        assert_eq!(request.images.len(), 2);
        assert_eq!(request.images[0].room, Some(Room::Exterior));
        assert_eq!(request.audio_tracks[0].kind, AudioKind::Voiceover);
        assert_eq!(request.target_seconds, 45.0);
        assert!(request.title.is_none());
    }

    #[test]
    fn test_request_default_target() {
        let json = r#"{"images": [], "output_path": "t.mp4"}"#;
        let request: TourRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.target_seconds, 60.0);
    }
}
