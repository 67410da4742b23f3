//! Timing budget for a plan.

use crate::options::PlannerOptions;

/// Largest share of the target that may be reserved for transitions.
pub const MAX_RESERVE_FRACTION: f64 = 0.05;

/// Content time budget for one plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    /// Estimated number of segments on the timeline
    pub estimated_segments: f64,
    /// Seconds set aside for crossfade overlap
    pub transition_reserve: f64,
    /// Seconds of scene content to fill
    pub available: f64,
    /// Starting duration of every scene
    pub initial_duration: f64,
}

impl Budget {
    pub fn compute(room_count: usize, options: &PlannerOptions) -> Self {
        let room_count = room_count.max(1);
        let estimated_segments =
            ((room_count + 2) as f64).min(options.max_ai_segments as f64 * 1.5);

        let transition_reserve = (options.crossfade_duration * (estimated_segments - 1.0))
            .min(options.target_seconds * MAX_RESERVE_FRACTION)
            .max(0.0);
        let available = options.target_seconds - transition_reserve;

        let initial_duration = (available / room_count as f64)
            .clamp(options.min_segment_duration, options.max_segment_duration);

        Self {
            estimated_segments,
            transition_reserve,
            available,
            initial_duration,
        }
    }
}
