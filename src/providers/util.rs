use crate::core::error::{RateError, RateResult};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently a failed provider request is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the attempt following failed attempt `attempt` (0-based):
    /// `initial_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Retries an async operation with exponential backoff
///
/// Every error returned by `operation` is treated as a transport failure. Once
/// `max_attempts` attempts have failed, the last error is reported as
/// [`RateError::Transport`] carrying the number of attempts made.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> RateResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt + 1 >= max_attempts {
                    return Err(RateError::Transport {
                        attempts: attempt + 1,
                        message: err.to_string(),
                    });
                }
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {}ms...",
                    attempt + 1,
                    max_attempts,
                    err,
                    delay.as_millis()
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
