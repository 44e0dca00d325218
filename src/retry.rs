//! Bounded polling with exponential backoff.
//!
//! Used by the confirmation waiter to re-query a receipt until the node has
//! mined the transaction. Only errors accepted by the classifier are retried;
//! anything else fails immediately.
//!
//! ```ignore
//! use crate::retry::{poll_until, PollPolicy};
//!
//! let receipt = poll_until(&PollPolicy::default(), "get_receipt", || async {
//!     fetch_receipt().await
//! }, ChainError::is_pending_receipt).await?;
//! ```

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::consts::{
    DEFAULT_POLL_INITIAL_DELAY_SECS, DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_POLL_MAX_DELAY_SECS,
    DEFAULT_POLL_MULTIPLIER,
};

/// Backoff schedule for a polling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Maximum number of attempts, at least 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Growth factor per attempt. 1.0 keeps the delay fixed.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::exponential(
            DEFAULT_POLL_INITIAL_DELAY_SECS,
            DEFAULT_POLL_MAX_ATTEMPTS,
            DEFAULT_POLL_MULTIPLIER,
            DEFAULT_POLL_MAX_DELAY_SECS,
        )
    }
}

impl PollPolicy {
    /// Create an exponential backoff policy.
    ///
    /// # Arguments
    /// * `initial_delay_secs` - Delay after the first failed attempt
    /// * `max_attempts` - Attempt budget (clamped to at least 1)
    /// * `multiplier` - Growth factor, e.g. 2.0 doubles the delay each time
    /// * `max_delay_secs` - Cap for a single delay
    pub fn exponential(
        initial_delay_secs: u64,
        max_attempts: u32,
        multiplier: f64,
        max_delay_secs: u64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_secs(initial_delay_secs),
            multiplier,
            max_delay: Duration::from_secs(max_delay_secs),
        }
    }

    /// Delay to wait after `attempt` (1-based) has failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.multiplier <= 1.0 {
            return self.initial_delay.min(self.max_delay);
        }

        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(millis as u64)
    }

    /// Sum of every delay the policy can incur before giving up.
    ///
    /// Saturates at `Duration::MAX`.
    pub fn total_budget(&self) -> Duration {
        let mut total = Duration::ZERO;
        for attempt in 1..self.max_attempts {
            let delay = self.delay_after(attempt);
            if delay >= self.max_delay {
                // every remaining sleep is capped
                let remaining = self.max_attempts - attempt;
                return total.saturating_add(self.max_delay.saturating_mul(remaining));
            }
            total = total.saturating_add(delay);
        }
        total
    }
}

/// Outcome of a polling loop that did not produce a value.
#[derive(Debug)]
pub enum PollError<E> {
    /// The classifier rejected the error; it is returned untouched.
    Fatal(E),
    /// Every attempt failed with a retryable error; carries the last one.
    Exhausted { attempts: u32, last: E },
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or the
/// policy's attempt budget is spent.
pub async fn poll_until<F, Fut, T, E, C>(
    policy: &PollPolicy,
    operation_name: &str,
    operation: F,
    is_retryable: C,
) -> Result<T, PollError<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> bool,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Poll succeeded");
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => {
                debug!(
                    operation = operation_name,
                    error = %e,
                    "Non-retryable error, failing immediately"
                );
                return Err(PollError::Fatal(e));
            }
            Err(e) => {
                if attempt >= policy.max_attempts {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Poll budget exhausted"
                    );
                    return Err(PollError::Exhausted { attempts: attempt, last: e });
                }

                let delay = policy.delay_after(attempt);
                debug!(
                    operation = operation_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Not ready, polling again after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, DEFAULT_POLL_MAX_ATTEMPTS);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(8));
    }

    #[test]
    fn test_delay_after_exponential_is_capped() {
        let policy = PollPolicy::exponential(1, 10, 2.0, 8);
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));
        assert_eq!(policy.delay_after(9), Duration::from_secs(8));
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_fixed_policy_and_budget() {
        let policy = PollPolicy::exponential(3, 4, 1.0, 60);
        assert_eq!(policy.delay_after(1), Duration::from_secs(3));
        assert_eq!(policy.delay_after(3), Duration::from_secs(3));
        // three sleeps between four attempts
        assert_eq!(policy.total_budget(), Duration::from_secs(9));
    }

    #[test]
    fn test_delay_after_huge_attempt_stays_capped() {
        let policy = PollPolicy::exponential(1, 10, 2.0, 8);
        assert_eq!(policy.delay_after(1 << 31), Duration::from_secs(8));
        assert_eq!(policy.delay_after((1 << 31) + 1), Duration::from_secs(8));
    }

    #[test]
    fn test_total_budget_capped_schedule() {
        // 1 + 2 + 4 + 8 * 6
        let policy = PollPolicy::exponential(1, 10, 2.0, 8);
        assert_eq!(policy.total_budget(), Duration::from_secs(55));
    }

    #[test]
    fn test_total_budget_saturates() {
        let policy = PollPolicy::exponential(u64::MAX, 3, 2.0, u64::MAX);
        assert_eq!(policy.total_budget(), Duration::MAX);

        let policy = PollPolicy::exponential(1, u32::MAX, 2.0, 8);
        assert_eq!(
            policy.total_budget(),
            Duration::from_secs(7) + Duration::from_secs(8) * (u32::MAX - 4)
        );
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = PollPolicy::exponential(1, 0, 2.0, 8);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.total_budget(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_succeeds_after_pending() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let policy = PollPolicy::exponential(1, 5, 2.0, 8);
        let result: Result<u32, PollError<String>> = poll_until(
            &policy,
            "test_op",
            || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err("pending".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_exhausted() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let policy = PollPolicy::exponential(1, 3, 2.0, 8);
        let result: Result<(), PollError<String>> = poll_until(
            &policy,
            "test_op",
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("pending".to_string())
                }
            },
            |_| true,
        )
        .await;

        match result {
            Err(PollError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "pending");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_fatal_error_stops_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let policy = PollPolicy::exponential(1, 5, 2.0, 8);
        let result: Result<(), PollError<String>> = poll_until(
            &policy,
            "test_op",
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("node down".to_string())
                }
            },
            |e| e == "pending",
        )
        .await;

        assert!(matches!(result, Err(PollError::Fatal(ref e)) if e == "node down"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
