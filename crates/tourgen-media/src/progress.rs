//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if self.is_complete {
            return 100.0;
        }
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).clamp(0.0, 100.0)
    }
}

/// Keys FFmpeg emits in its `-progress` blocks.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Outcome of feeding one stderr line to [`ProgressParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum StderrLine {
    /// Part of a progress block; carries a snapshot when the block ends
    Progress(Option<FfmpegProgress>),
    /// Anything else FFmpeg printed (warnings, errors)
    Diagnostic(String),
}

/// Incremental parser for FFmpeg's stderr when run with `-progress pipe:2`.
#[derive(Debug, Default)]
pub struct ProgressParser {
    current: FfmpegProgress,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) -> StderrLine {
        let trimmed = line.trim();
        let Some((key, value)) = trimmed.split_once('=') else {
            return StderrLine::Diagnostic(trimmed.to_string());
        };
        if !(PROGRESS_KEYS.contains(&key) || key.starts_with("stream_")) {
            return StderrLine::Diagnostic(trimmed.to_string());
        }

        match key {
            "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.current.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.current.frame = frame;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.current.speed = speed;
                }
            }
            "progress" => {
                self.current.is_complete = value == "end";
                return StderrLine::Progress(Some(self.current.clone()));
            }
            _ => {}
        }

        StderrLine::Progress(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };

        assert!((progress.percentage(10000) - 50.0).abs() < 0.01);
        assert!((progress.percentage(2000) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(0), 0.0);
    }

    #[test]
    fn test_parser_blocks() {
        let mut parser = ProgressParser::new();

        assert_eq!(parser.feed("frame=120"), StderrLine::Progress(None));
        assert_eq!(parser.feed("out_time_us=4000000"), StderrLine::Progress(None));
        assert_eq!(parser.feed("speed=2.5x"), StderrLine::Progress(None));

        match parser.feed("progress=continue") {
            StderrLine::Progress(Some(p)) => {
                assert_eq!(p.frame, 120);
                assert_eq!(p.out_time_ms, 4000);
                assert!((p.speed - 2.5).abs() < 0.01);
                assert!(!p.is_complete);
            }
            other => panic!("unexpected {:?}", other),
        }

        match parser.feed("progress=end") {
            StderrLine::Progress(Some(p)) => assert!(p.is_complete),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parser_diagnostics() {
        let mut parser = ProgressParser::new();
        assert_eq!(
            parser.feed("[AVFilterGraph @ 0x1] No such filter: 'xfadee'"),
            StderrLine::Diagnostic("[AVFilterGraph @ 0x1] No such filter: 'xfadee'".into())
        );
        assert!(matches!(
            parser.feed("Error initializing filter 'scale' with args 'w=-5'"),
            StderrLine::Diagnostic(_)
        ));
        assert_eq!(parser.feed("stream_0_0_q=28.0"), StderrLine::Progress(None));
    }
}
