//! Exponential-backoff retry for any fallible async operation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-based), capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay.min(self.max_delay);
        for _ in 1..attempt {
            let next = delay.as_secs_f64() * self.backoff_multiplier.max(0.0);
            delay = Duration::try_from_secs_f64(next)
                .unwrap_or(self.max_delay)
                .min(self.max_delay);
        }
        delay
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// Sleeps between attempts, never after the last one. Every failed attempt is
/// logged at warn level tagged with `label`; exhaustion is logged at error
/// level and the last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(label, attempt, max_attempts, error = %e, "Attempt failed");
                if attempt >= max_attempts {
                    error!(label, attempts = max_attempts, error = %e, "All attempts failed");
                    return Err(e);
                }
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
        }
    }
}
