//! Output encoding profile.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default output width
pub const DEFAULT_WIDTH: u32 = 1920;
/// Default output height
pub const DEFAULT_HEIGHT: u32 = 1080;
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF
pub const DEFAULT_CRF: u8 = 20;
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Pixel format every rendered segment is normalized to
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Target format of every rendered segment and of the final tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutputProfile {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl OutputProfile {
    /// Override the frame geometry.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// FFmpeg output arguments for the video stream.
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            PIXEL_FORMAT.to_string(),
        ]
    }

    /// FFmpeg output arguments for the audio stream.
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}
