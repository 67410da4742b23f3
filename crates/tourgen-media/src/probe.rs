//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    pub codec: String,
    /// Whether the file carries at least one audio stream
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Probe a video file for information.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    // Container duration first, stream duration as a fallback
    let duration = probe
        .format
        .duration
        .as_deref()
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97"); `0/0` yields `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den <= 0.0 {
                return None;
            }
            num / den
        }
        None => s.parse().ok()?,
    };
    (rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720,
                 "r_frame_rate": "24/1", "avg_frame_rate": "0/0", "duration": "8.000"},
                {"codec_type": "audio", "codec_name": "aac"}
            ],
            "format": {"duration": "8.021"}
        }"#;
        let info = parse_probe_output(json).unwrap();

        assert_eq!((info.width, info.height), (1280, 720));
        assert!((info.fps - 24.0).abs() < 0.01);
        assert!((info.duration - 8.021).abs() < 1e-9);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_without_video() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        assert!(matches!(parse_probe_output(json), Err(MediaError::InvalidVideo(_))));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = probe_video("/definitely/not/here.mp4").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
