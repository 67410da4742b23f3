//! Worker configuration.

use std::path::PathBuf;

use tourgen_media::timeline::DEFAULT_CROSSFADE_SECS;
use tourgen_media::{TimelineOptions, MUSIC_DUCKING_FACTOR};
use tourgen_models::OutputProfile;
use tourgen_planner::PlannerOptions;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work directory for temporary files
    pub work_dir: PathBuf,
    /// Scene renders allowed in flight at once
    pub max_concurrent_renders: usize,
    /// Encoding target for every rendered and assembled clip
    pub profile: OutputProfile,
    /// Crossfade length between segments
    pub crossfade_secs: f64,
    /// Join segments with hard cuts instead of crossfades
    pub hard_cuts: bool,
    /// Cap on AI-synthesis scenes per tour
    pub max_ai_segments: usize,
    /// Kill a single FFmpeg invocation after this many seconds
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/tourgen"),
            max_concurrent_renders: 1,
            profile: OutputProfile::default(),
            crossfade_secs: DEFAULT_CROSSFADE_SECS,
            hard_cuts: false,
            max_ai_segments: PlannerOptions::default().max_ai_segments,
            ffmpeg_timeout_secs: Some(1800),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let profile = OutputProfile::default()
            .with_resolution(
                env_parse("TOUR_OUTPUT_WIDTH").unwrap_or(defaults.profile.width),
                env_parse("TOUR_OUTPUT_HEIGHT").unwrap_or(defaults.profile.height),
            )
            .with_fps(env_parse("TOUR_OUTPUT_FPS").unwrap_or(defaults.profile.fps));

        Self {
            work_dir: std::env::var("TOUR_WORK_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_concurrent_renders: env_parse("TOUR_MAX_CONCURRENT_RENDERS")
                .unwrap_or(defaults.max_concurrent_renders)
                .max(1),
            profile,
            crossfade_secs: env_parse::<f64>("TOUR_CROSSFADE_SECS")
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.crossfade_secs),
            hard_cuts: std::env::var("TOUR_HARD_CUTS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.hard_cuts),
            max_ai_segments: env_parse("TOUR_MAX_AI_SEGMENTS").unwrap_or(defaults.max_ai_segments),
            ffmpeg_timeout_secs: env_parse::<u64>("TOUR_FFMPEG_TIMEOUT_SECS")
                .map(|secs| (secs > 0).then_some(secs))
                .unwrap_or(defaults.ffmpeg_timeout_secs),
        }
    }

    /// Planner options for a tour of `target_seconds`.
    pub fn planner_options(&self, target_seconds: f64) -> PlannerOptions {
        PlannerOptions::default()
            .with_target_seconds(target_seconds)
            .with_max_ai_segments(self.max_ai_segments)
            .with_crossfade_duration(if self.hard_cuts { 0.0 } else { self.crossfade_secs })
    }

    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            profile: self.profile.clone(),
            crossfade_duration: self.crossfade_secs,
            hard_cuts: self.hard_cuts,
            ducking_factor: MUSIC_DUCKING_FACTOR,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 9] = [
        "TOUR_WORK_DIR",
        "TOUR_MAX_CONCURRENT_RENDERS",
        "TOUR_OUTPUT_WIDTH",
        "TOUR_OUTPUT_HEIGHT",
        "TOUR_OUTPUT_FPS",
        "TOUR_CROSSFADE_SECS",
        "TOUR_HARD_CUTS",
        "TOUR_MAX_AI_SEGMENTS",
        "TOUR_FFMPEG_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = WorkerConfig::from_env();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/tourgen"));
        assert_eq!(config.max_concurrent_renders, 1);
        assert_eq!((config.profile.width, config.profile.height, config.profile.fps), (1920, 1080, 30));
        assert_eq!(config.crossfade_secs, 0.75);
        assert!(!config.hard_cuts);
        assert_eq!(config.max_ai_segments, 15);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("TOUR_WORK_DIR", "/var/tmp/tours");
        std::env::set_var("TOUR_MAX_CONCURRENT_RENDERS", "0");
        std::env::set_var("TOUR_OUTPUT_WIDTH", "1280");
        std::env::set_var("TOUR_OUTPUT_HEIGHT", "720");
        std::env::set_var("TOUR_CROSSFADE_SECS", "-2");
        std::env::set_var("TOUR_HARD_CUTS", "true");
        std::env::set_var("TOUR_MAX_AI_SEGMENTS", "4");
        std::env::set_var("TOUR_FFMPEG_TIMEOUT_SECS", "0");

        let config = WorkerConfig::from_env();
        assert_eq!(config.work_dir, PathBuf::from("/var/tmp/tours"));
        assert_eq!(config.max_concurrent_renders, 1);
        assert_eq!((config.profile.width, config.profile.height), (1280, 720));
        assert_eq!(config.crossfade_secs, 0.75);
        assert!(config.hard_cuts);
        assert_eq!(config.max_ai_segments, 4);
        assert_eq!(config.ffmpeg_timeout_secs, None);

        clear_env();
    }

    #[test]
    fn test_derived_options() {
        let config = WorkerConfig {
            hard_cuts: true,
            max_ai_segments: 3,
            ..WorkerConfig::default()
        };
        let planner = config.planner_options(45.0);
        assert_eq!(planner.target_seconds, 45.0);
        assert_eq!(planner.max_ai_segments, 3);
        assert_eq!(planner.crossfade_duration, 0.0);

        let timeline = config.timeline_options();
        assert!(timeline.hard_cuts);
        assert_eq!(timeline.ducking_factor, 0.4);
    }
}
