//! Rendered segments and audio tracks fed to the timeline assembler.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{Room, SceneId, Technique};

/// A rendered clip for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSegment {
    pub scene_id: SceneId,

    pub path: PathBuf,

    /// Duration in seconds used on the timeline
    pub duration: f64,

    pub technique: Technique,

    pub room: Room,

    /// Whether the clip carries its own audio stream
    #[serde(default)]
    pub has_audio: bool,
}

/// What an audio track contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AudioKind {
    Voiceover,
    Music,
}

impl AudioKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioKind::Voiceover => "voiceover",
            AudioKind::Music => "music",
        }
    }
}

impl fmt::Display for AudioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An audio file placed on the tour timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioTrack {
    pub path: PathBuf,

    pub kind: AudioKind,

    /// Linear gain in 0..=1
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Offset on the output timeline in seconds
    #[serde(default)]
    pub start_time: f64,

    /// Length to use in seconds; zero means the whole file
    #[serde(default)]
    pub duration: f64,
}

fn default_volume() -> f64 {
    1.0
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>, kind: AudioKind) -> Self {
        Self {
            path: path.into(),
            kind,
            volume: default_volume(),
            start_time: 0.0,
            duration: 0.0,
        }
    }

    pub fn voiceover(path: impl Into<PathBuf>) -> Self {
        Self::new(path, AudioKind::Voiceover)
    }

    pub fn music(path: impl Into<PathBuf>) -> Self {
        Self::new(path, AudioKind::Music)
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// End of the track on the timeline, `None` when it plays to the end of its file.
    pub fn end_time(&self) -> Option<f64> {
        (self.duration > 0.0).then(|| self.start_time + self.duration)
    }

    /// Whether the two tracks play at the same time at any point.
    ///
    /// A track without a known duration is treated as running indefinitely.
    pub fn overlaps(&self, other: &AudioTrack) -> bool {
        let self_end = self.end_time().unwrap_or(f64::INFINITY);
        let other_end = other.end_time().unwrap_or(f64::INFINITY);
        self.start_time < other_end && other.start_time < self_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_defaults() {
        let track: AudioTrack =
            serde_json::from_str(r#"{"path": "vo.mp3", "kind": "voiceover"}"#).unwrap();
        assert_eq!(track.volume, 1.0);
        assert_eq!(track.start_time, 0.0);
        assert!(track.end_time().is_none());
    }

    #[test]
    fn test_overlap() {
        let music = AudioTrack::music("m.mp3").with_duration(30.0);
        let early = AudioTrack::voiceover("a.mp3").with_start_time(5.0).with_duration(10.0);
        let late = AudioTrack::voiceover("b.mp3").with_start_time(30.0).with_duration(5.0);
        let open = AudioTrack::voiceover("c.mp3").with_start_time(29.0);

        assert!(music.overlaps(&early));
        assert!(!music.overlaps(&late));
        assert!(music.overlaps(&open));
    }
}
