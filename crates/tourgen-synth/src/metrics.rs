//! Synthesis metrics.
//!
//! Counters for submissions, status checks and retries, plus end-to-end
//! render latency. No exporter is installed here.

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Submitted generation requests by status.
    pub const SUBMISSIONS_TOTAL: &str = "tourgen_synth_submissions_total";

    /// Status checks by outcome.
    pub const POLL_ATTEMPTS_TOTAL: &str = "tourgen_synth_poll_attempts_total";

    /// Retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "tourgen_synth_retries_total";

    /// Time from submission to a downloaded clip, in seconds.
    pub const RENDER_SECONDS: &str = "tourgen_synth_render_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a submission outcome ("accepted" or an error class).
pub fn record_submission(status: &str) {
    counter!(names::SUBMISSIONS_TOTAL, "status" => status.to_string()).increment(1);
}

/// Record one status check.
pub fn record_poll(outcome: &str) {
    counter!(names::POLL_ATTEMPTS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(names::RETRIES_TOTAL, "operation" => operation.to_string()).increment(1);
}

/// Record how long a render took and how it ended.
pub fn record_render(outcome: &str, seconds: f64) {
    histogram!(names::RENDER_SECONDS, "outcome" => outcome.to_string()).record(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_submission("accepted");
        record_poll("pending");
        record_retry("submit");
        record_render("done", 12.5);
    }

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            names::SUBMISSIONS_TOTAL,
            names::POLL_ATTEMPTS_TOTAL,
            names::RETRIES_TOTAL,
            names::RENDER_SECONDS,
        ] {
            assert!(name.starts_with("tourgen_synth_"));
        }
    }
}
