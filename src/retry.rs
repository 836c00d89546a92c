// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Bounded Retry with Fixed Backoff
//!
//! [`retry_fixed`] runs a fallible async operation until it succeeds or the
//! attempt budget is spent, sleeping a constant delay between attempts.
//! There is no jitter and no exponential growth: the budget is small and the
//! caller is a short-lived process, not a long-running service.

use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, warn};

/// The delay between two connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,

    /// Fixed wait between two consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay,
        }
    }
}

/// Returned when every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    /// Number of attempts actually made.
    pub attempts: u32,

    /// The error of the final attempt; earlier errors are discarded.
    pub last_error: E,
}

/// Runs `operation` up to `policy.max_attempts` times.
///
/// The operation receives the 1-based attempt number. The first success is
/// returned immediately. After a failure the loop sleeps `policy.delay`,
/// except after the final attempt, which returns [`Exhausted`] right away.
///
/// # Example
/// ```ignore
/// let conn = retry_fixed(&RetryPolicy::new(5, DEFAULT_RETRY_DELAY), |_| async {
///     connector.connect(&params).await
/// })
/// .await?;
/// ```
pub async fn retry_fixed<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                debug!(attempt, "attempt succeeded");
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => {
                warn!(attempt, max_attempts, error = %err, "retry budget exhausted");
                return Err(Exhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "attempt failed, retrying in {:?}",
                    policy.delay
                );
                sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_secs(1))
    }

    /// Fails the first `failures` calls, then succeeds with the attempt number.
    fn flaky(
        failures: u32,
        calls: Arc<Mutex<Vec<u32>>>,
    ) -> impl FnMut(u32) -> std::future::Ready<Result<u32, String>> {
        move |attempt| {
            calls.lock().unwrap().push(attempt);
            if attempt <= failures {
                std::future::ready(Err(format!("refused #{attempt}")))
            } else {
                std::future::ready(Ok(attempt))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_stops_without_sleeping() {
        let calls = Arc::new(Mutex::new(vec![]));
        let start = Instant::now();

        let result = retry_fixed(&policy(5), flaky(0, calls.clone())).await;

        assert_eq!(result, Ok(1));
        assert_eq!(*calls.lock().unwrap(), vec![1]);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn k_failures_then_success_takes_k_plus_one_attempts() {
        let calls = Arc::new(Mutex::new(vec![]));
        let start = Instant::now();

        let result = retry_fixed(&policy(5), flaky(3, calls.clone())).await;

        assert_eq!(result, Ok(4));
        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_smaller_than_failures_exhausts_with_last_reason() {
        let calls = Arc::new(Mutex::new(vec![]));
        let start = Instant::now();

        let result = retry_fixed(&policy(3), flaky(3, calls.clone())).await;

        assert_eq!(
            result,
            Err(Exhausted {
                attempts: 3,
                last_error: "refused #3".to_owned(),
            })
        );
        assert_eq!(calls.lock().unwrap().len(), 3);
        // no sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let calls = Arc::new(Mutex::new(vec![]));

        let result = retry_fixed(&policy(0), flaky(10, calls.clone())).await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }
}
