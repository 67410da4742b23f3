//! Planner tuning knobs.

use serde::{Deserialize, Serialize};
use tourgen_models::Technique;

use crate::error::{PlanError, PlanResult};

/// Inclusive duration range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationBounds {
    pub min: f64,
    pub max: f64,
}

impl DurationBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, seconds: f64) -> f64 {
        seconds.clamp(self.min, self.max)
    }

    /// Containment with a millisecond of slack for accumulated float error.
    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.min - 1e-3 && seconds <= self.max + 1e-3
    }

    fn validate(&self, name: &str) -> PlanResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min <= 0.0 || self.min > self.max {
            return Err(PlanError::invalid_parameters(format!(
                "{} must satisfy 0 < min <= max, got {}..{}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Options for [`crate::plan_tour`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Desired tour length in seconds
    pub target_seconds: f64,
    /// Lower clamp for the initial per-scene duration
    pub min_segment_duration: f64,
    /// Upper clamp for the initial per-scene duration
    pub max_segment_duration: f64,
    /// How many scenes may use AI synthesis
    pub max_ai_segments: usize,
    /// Transition overlap between adjacent segments
    pub crossfade_duration: f64,
    /// Duration cap applied to scenes demoted to pan-zoom
    pub pan_zoom_cap: f64,
    pub ai_bounds: DurationBounds,
    pub pan_zoom_bounds: DurationBounds,
    /// Longest filler scene
    pub filler_max_duration: f64,
    /// Shortfall a filler must cover before one is added
    pub filler_min_shortfall: f64,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            target_seconds: 60.0,
            min_segment_duration: 4.0,
            max_segment_duration: 8.0,
            max_ai_segments: 15,
            crossfade_duration: 0.75,
            pan_zoom_cap: 6.0,
            ai_bounds: DurationBounds::new(4.0, 8.0),
            pan_zoom_bounds: DurationBounds::new(3.0, 10.0),
            filler_max_duration: 6.0,
            filler_min_shortfall: 3.0,
        }
    }
}

impl PlannerOptions {
    pub fn with_target_seconds(mut self, target_seconds: f64) -> Self {
        self.target_seconds = target_seconds;
        self
    }

    pub fn with_max_ai_segments(mut self, max_ai_segments: usize) -> Self {
        self.max_ai_segments = max_ai_segments;
        self
    }

    pub fn with_crossfade_duration(mut self, crossfade_duration: f64) -> Self {
        self.crossfade_duration = crossfade_duration;
        self
    }

    /// Duration bounds a scene rendered with `technique` must respect.
    pub fn bounds_for(&self, technique: Technique) -> DurationBounds {
        match technique {
            Technique::AiSynthesis => self.ai_bounds,
            Technique::PanZoom => self.pan_zoom_bounds,
        }
    }

    /// Reject non-finite or non-positive values before planning.
    pub fn validate(&self) -> PlanResult<()> {
        let positive = [
            ("target_seconds", self.target_seconds),
            ("min_segment_duration", self.min_segment_duration),
            ("max_segment_duration", self.max_segment_duration),
            ("pan_zoom_cap", self.pan_zoom_cap),
            ("filler_max_duration", self.filler_max_duration),
            ("filler_min_shortfall", self.filler_min_shortfall),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlanError::invalid_parameters(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }

        if !self.crossfade_duration.is_finite() || self.crossfade_duration < 0.0 {
            return Err(PlanError::invalid_parameters(format!(
                "crossfade_duration must be finite and non-negative, got {}",
                self.crossfade_duration
            )));
        }

        if self.min_segment_duration > self.max_segment_duration {
            return Err(PlanError::invalid_parameters(format!(
                "min_segment_duration {} exceeds max_segment_duration {}",
                self.min_segment_duration, self.max_segment_duration
            )));
        }

        self.ai_bounds.validate("ai_bounds")?;
        self.pan_zoom_bounds.validate("pan_zoom_bounds")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PlannerOptions::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_target() {
        for target in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = PlannerOptions::default()
                .with_target_seconds(target)
                .validate()
                .unwrap_err();
            assert!(matches!(err, PlanError::InvalidParameters(_)));
        }
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let options = PlannerOptions {
            ai_bounds: DurationBounds::new(8.0, 4.0),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize() {
        let options: PlannerOptions = serde_json::from_str(r#"{"target_seconds": 30}"#).unwrap();
        assert_eq!(options.target_seconds, 30.0);
        assert_eq!(options.max_ai_segments, 15);
    }
}
