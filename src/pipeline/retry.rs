//! Bounded retry with exponential backoff around one extraction attempt.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::warn;

use crate::config::pipeline::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::RETRIES_TOTAL;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    /// Wait before attempt `attempt + 1`: `base × 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Only rate limits and panics are retried, and only while attempts remain.
    pub fn should_retry(&self, attempt: u32, error: &PipelineError) -> bool {
        attempt < self.max_attempts
            && (error.is_rate_limited() || matches!(error, PipelineError::Panicked(_)))
    }
}

/// Passed to the retry callback before each backoff sleep.
#[derive(Debug)]
pub struct RetryNotice<'a> {
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: &'a PipelineError,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs `attempt_fn(1)`, `attempt_fn(2)`, ... until it succeeds, fails with a
/// terminal error, or the policy is exhausted. Panics inside an attempt are
/// caught and reported as `PipelineError::Panicked`. Backoff sleeps suspend
/// only the calling task.
pub async fn run_with_retry<T, F, Fut, R>(
    policy: &RetryPolicy,
    mut attempt_fn: F,
    mut on_retry: R,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnMut(&RetryNotice<'_>),
{
    let mut attempt = 1;
    loop {
        let result = AssertUnwindSafe(attempt_fn(attempt))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(PipelineError::Panicked(panic_message(&*payload))));

        match result {
            Ok(value) => return Ok(value),
            Err(error) if policy.should_retry(attempt, &error) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_secs = delay.as_secs_f64(),
                    error = %error,
                    "Transient failure, backing off"
                );
                RETRIES_TOTAL.inc();
                on_retry(&RetryNotice {
                    attempt,
                    max_attempts: policy.max_attempts,
                    delay,
                    error: &error,
                });
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
