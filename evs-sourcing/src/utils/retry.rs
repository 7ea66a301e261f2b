//! Retry Policy
//!
//! Bounded exponential backoff for transient provider failures. The policy is
//! an explicit object handed to the search adapter; call sites never write
//! their own sleep/retry loops.

use evs_common::config::RetrySettings;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

/// Errors that can tell whether retrying might help
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Retry policy: max attempts, base delay, delay cap, jitter
///
/// **Backoff Strategy:**
/// - Attempt n (n ≥ 2) waits `base_delay * 2^(n-2)`, capped at `max_delay`
/// - Each wait is randomized by ±`jitter` (fraction of the wait)
/// - Non-transient errors fail immediately
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms.max(settings.base_delay_ms)),
            jitter: settings.jitter.clamp(0.0, 1.0),
        }
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Un-jittered wait after failed attempt number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        delay.mul_f64(factor)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    ///
    /// # Arguments
    /// * `operation_name` - Name for logging (e.g., "pexels query")
    /// * `operation` - Async closure performing one attempt
    pub async fn run<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + std::fmt::Display,
    {
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            if attempt > 1 {
                tracing::debug!(operation = operation_name, attempt, "Retrying operation");
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis(),
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !err.is_transient() {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Permanent failure, not retrying"
                        );
                        return Err(err);
                    }

                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis(),
                            error = %err,
                            "Operation failed: retry attempts exhausted"
                        );
                        return Err(err);
                    }

                    let wait = self.jittered(self.backoff_for(attempt));
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        backoff_ms = wait.as_millis(),
                        error = %err,
                        "Transient failure, will retry after backoff"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
