//! Retry with exponential backoff.
//!
//! Delays grow by `multiplier` from `initial_interval` up to `max_interval`.
//! The whole loop is bounded by `max_elapsed`, measured from the first
//! attempt; the last sleep is shortened so the final attempt lands on the
//! deadline instead of past it.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{info, warn};

/// Backoff schedule and total retry budget
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    /// 1s, doubling, capped at 30s, for at most 5 minutes.
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            multiplier: 2.0,
            max_interval: Duration::from_secs(30),
            max_elapsed: Duration::from_secs(5 * 60),
        }
    }
}

impl BackoffPolicy {
    /// Delay that follows `current`, never above `max_interval`
    ///
    /// A product that does not fit in a `Duration` (overflow, NaN) is
    /// treated as the cap.
    pub fn next_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation returned an error classified as non-retryable
    Permanent { error: E, attempts: u32 },
    /// Every attempt within the budget failed
    Exhausted {
        last: E,
        attempts: u32,
        elapsed: Duration,
    },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Permanent { attempts, .. } | RetryError::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the budget runs out.
///
/// `is_transient` decides whether an error is worth another attempt.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    operation_name: &str,
    policy: &BackoffPolicy,
    is_transient: C,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> bool,
{
    let started = Instant::now();
    let mut interval = policy.initial_interval.min(policy.max_interval);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        let error = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    info!(
                        operation = operation_name,
                        attempts, "Operation succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !is_transient(&error) {
            warn!(
                operation = operation_name,
                attempts,
                %error,
                "Operation failed permanently; not retrying"
            );
            return Err(RetryError::Permanent { error, attempts });
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.max_elapsed {
            warn!(
                operation = operation_name,
                attempts,
                ?elapsed,
                %error,
                "Retry budget exhausted"
            );
            return Err(RetryError::Exhausted {
                last: error,
                attempts,
                elapsed,
            });
        }

        let delay = interval.min(policy.max_elapsed - elapsed);
        warn!(
            operation = operation_name,
            attempts,
            %error,
            ?delay,
            "Operation failed; retrying"
        );

        sleep(delay).await;
        interval = policy.next_interval(interval);
    }
}
