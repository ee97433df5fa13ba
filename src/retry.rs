//! Bounded retry policy
//!
//! Invalid and transport-failed step attempts are retried verbatim with the
//! same step definition and context. Retries are bounded with exponential
//! backoff; exhaustion is a terminal outcome, never a livelock.

use crate::config::RetrySection;
use std::time::Duration;

/// Ceiling on any single backoff interval
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry parameters for step attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            multiplier: multiplier.max(1.0),
        }
    }

    /// Policy with negligible backoff, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::from_millis(1), 1.0)
    }

    /// Backoff to sleep after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = self.multiplier.powi(exponent as i32);
        let backoff = self.initial_backoff.as_secs_f64() * factor;
        Duration::from_secs_f64(backoff.min(MAX_BACKOFF.as_secs_f64()))
    }
}

impl From<&RetrySection> for RetryPolicy {
    fn from(section: &RetrySection) -> Self {
        Self::new(
            section.max_attempts,
            Duration::from_millis(section.initial_backoff_ms),
            section.backoff_multiplier,
        )
    }
}
