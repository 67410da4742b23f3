//! Submission retry and poll backoff.
//!
//! Two separate policies:
//! - Submission: a few attempts with doubling delay, skipped entirely for
//!   terminal service rejections
//! - Polling: capped exponential backoff with additive jitter between status checks

use std::time::Duration;

use rand::Rng;
use tracing::{info_span, warn, Instrument};

use crate::error::SynthResult;
use crate::metrics::record_retry;

// =============================================================================
// Submission Retry
// =============================================================================

/// Submission retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt (in milliseconds); doubles afterwards.
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_parse("VEO_SUBMIT_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts).max(1),
            base_delay_ms: env_parse("VEO_SUBMIT_RETRY_BASE_MS").unwrap_or(defaults.base_delay_ms),
            max_delay_ms: defaults.max_delay_ms,
        }
    }

    /// Delay after the given failed attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(exp.min(self.max_delay_ms))
    }
}

/// Execute an async operation with retry.
///
/// Retries errors for which [`crate::error::SynthError::is_retryable`] holds; quota,
/// permission and invalid-argument rejections return after the first attempt.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> SynthResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = SynthResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let span = info_span!("synth_retry", operation = %operation, attempt = attempt + 1);

        match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let delay = config.delay_for(attempt);

                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Synthesis request failed, retrying: {}",
                    e
                );

                record_retry(operation);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// =============================================================================
// Poll Backoff
// =============================================================================

/// Status polling configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Status checks before the operation is considered timed out.
    pub max_attempts: u32,
    /// First delay (in milliseconds).
    pub base_delay_ms: u64,
    /// Growth factor per attempt.
    pub factor: f64,
    /// Cap on the delay before jitter (in milliseconds).
    pub max_delay_ms: u64,
    /// Upper bound of the additive jitter (in milliseconds).
    pub jitter_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            base_delay_ms: 1000,
            factor: 1.5,
            max_delay_ms: 30_000,
            jitter_ms: 1000,
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_parse("VEO_POLL_MAX_ATTEMPTS")
                .unwrap_or(defaults.max_attempts)
                .max(1),
            ..defaults
        }
    }

    /// Backoff before jitter: `min(base * factor^attempt, max)`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let raw = self.base_delay_ms as f64 * self.factor.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max_delay_ms as f64)
        } else {
            self.max_delay_ms as f64
        };
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delay to wait after the given "not done" poll (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::rng().random_range(0..self.jitter_ms)
        } else {
            0
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

// =============================================================================
// Tests
// =============================================================================
