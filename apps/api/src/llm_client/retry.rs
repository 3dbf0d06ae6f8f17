//! Retry policy for model calls.
//!
//! The policy is plain data; `with_retry` applies it to any fallible async operation
//! together with a predicate deciding which errors are worth another attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Max attempts and exponential backoff base for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, after `failed_attempts` failures: base * 2^n (2s, 4s, 8s...).
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(failed_attempts))
    }
}

/// Why `with_retry` gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The predicate rejected the error; no further attempts were made.
    Fatal(E),
    /// Every attempt failed with a retryable error. Carries the last one.
    Exhausted { attempts: u32, last: E },
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the policy's
/// attempt budget is spent. The operation receives the 1-based attempt number.
pub async fn with_retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retryable(&err) {
            warn!(attempt, "attempt failed with non-retryable error: {err}");
            return Err(RetryError::Fatal(err));
        }

        if attempt >= max_attempts {
            warn!(attempt, "attempt failed, no attempts left: {err}");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.backoff(attempt);
        warn!(
            "attempt {}/{} failed, retrying after {}ms: {}",
            attempt,
            max_attempts,
            delay.as_millis(),
            err
        );
        tokio::time::sleep(delay).await;
    }
}
