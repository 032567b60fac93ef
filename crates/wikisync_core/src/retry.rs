//! Bounded retries for remote wiki calls.
//!
//! Every attempt is classified through [`classify_failure`]: rate limits and
//! transient failures back off exponentially, permanent failures surface on
//! the first attempt.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::mediawiki::{FailureKind, classify_failure};

pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based), doubled each time and
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

pub struct RetryExecutor<S: Sleeper = ThreadSleeper> {
    policy: RetryPolicy,
    sleeper: S,
    retries: usize,
}

impl RetryExecutor<ThreadSleeper> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, ThreadSleeper)
    }
}

impl<S: Sleeper> RetryExecutor<S> {
    pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            policy,
            sleeper,
            retries: 0,
        }
    }

    /// Retries performed across every `run` so far.
    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn run<T, F>(&mut self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let error = match operation() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            let kind = classify_failure(&error);
            if kind == FailureKind::Permanent || attempt >= max_attempts {
                return Err(error.context(format!("{label} failed after {attempt} attempt(s)")));
            }
            let delay = self.policy.delay_for(attempt);
            warn!(
                operation = label,
                attempt,
                max_attempts,
                kind = ?kind,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "retrying wiki call"
            );
            self.sleeper.sleep(delay);
            self.retries += 1;
            attempt += 1;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use anyhow::bail;

    use super::{RetryExecutor, RetryPolicy, Sleeper};
    use crate::mediawiki::WikiApiError;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) sleeps: Vec<Duration>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }
    }

    pub(crate) fn test_executor(max_attempts: u32) -> RetryExecutor<RecordingSleeper> {
        RetryExecutor::with_sleeper(
            RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
            },
            RecordingSleeper::default(),
        )
    }

    #[test]
    fn rate_limited_twice_then_succeeds() {
        let mut executor = test_executor(8);
        let mut calls = 0;
        let value = executor
            .run("edit Rock", || {
                calls += 1;
                if calls <= 2 {
                    return Err(WikiApiError::Http { status: 429 }.into());
                }
                Ok("saved")
            })
            .expect("eventually succeeds");

        assert_eq!(value, "saved");
        assert_eq!(calls, 3);
        assert_eq!(
            executor.sleeper().sleeps,
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
        assert_eq!(executor.retries(), 2);
    }

    #[test]
    fn permanent_failure_is_not_retried() {
        let mut executor = test_executor(8);
        let mut calls = 0;
        let error = executor
            .run("edit Rock", || -> anyhow::Result<()> {
                calls += 1;
                Err(WikiApiError::Api {
                    code: "protectedpage".to_string(),
                    info: "protected".to_string(),
                }
                .into())
            })
            .expect_err("must fail");

        assert_eq!(calls, 1);
        assert!(executor.sleeper().sleeps.is_empty());
        assert!(format!("{error:#}").contains("protectedpage"));
    }

    #[test]
    fn attempt_cap_surfaces_last_error() {
        let mut executor = test_executor(3);
        let mut calls = 0;
        let error = executor
            .run("delete Data:Recipes/4", || -> anyhow::Result<()> {
                calls += 1;
                bail!("connection reset")
            })
            .expect_err("must fail");

        assert_eq!(calls, 3);
        assert_eq!(executor.sleeper().sleeps.len(), 2);
        let rendered = format!("{error:#}");
        assert!(rendered.contains("after 3 attempt(s)"));
        assert!(rendered.contains("connection reset"));
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(6), Duration::from_secs(32));
        assert_eq!(policy.delay_for(7), Duration::from_secs(60));
        assert_eq!(policy.delay_for(40), Duration::from_secs(60));
    }
}
