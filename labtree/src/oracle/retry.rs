//! Retry policy for transient oracle failures.
//!
//! Quota/429 responses are retried with exponential backoff plus jitter so
//! concurrent clients do not re-hit the limit in lockstep. Bounded attempts:
//! exhaustion surfaces as a normal `OracleError::RateLimited`.

use std::time::Duration;

/// How many times and with what delays to retry a transient failure.
#[derive(Debug, Clone)]
pub enum RetryPolicy {
    /// Fail immediately on error.
    None,
    /// Constant delay between attempts.
    Fixed {
        max_attempts: usize,
        interval: Duration,
    },
    /// Exponentially increasing delay, capped at `max_interval`.
    Exponential {
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::None
    }

    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    pub fn exponential(
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// True when attempt number `attempt` (0-based) may still be retried.
    pub fn should_retry(&self, attempt: usize) -> bool {
        match self {
            RetryPolicy::None => false,
            RetryPolicy::Fixed { max_attempts, .. }
            | RetryPolicy::Exponential { max_attempts, .. } => attempt < *max_attempts,
        }
    }

    /// Base delay before retrying the given attempt (no jitter).
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let secs = initial_interval.as_secs_f64() * multiplier.powi(attempt as i32);
                Duration::from_secs_f64(secs).min(*max_interval)
            }
        }
    }

    /// Base delay plus up to `jitter` of random slack.
    pub fn jittered_delay(&self, attempt: usize, jitter: Duration) -> Duration {
        self.delay(attempt) + jitter.mul_f64(rand::random::<f64>())
    }
}

impl Default for RetryPolicy {
    /// The original client's schedule: 3 attempts, 2s doubling, ~30s cap.
    fn default() -> Self {
        RetryPolicy::exponential(3, Duration::from_secs(2), Duration::from_secs(30), 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_never_retries() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(0));
        assert_eq!(policy.delay(0), Duration::ZERO);
    }

    #[test]
    fn fixed_retries_up_to_max_attempts() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(100));
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert_eq!(policy.delay(1), Duration::from_millis(100));
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_secs(2), Duration::from_secs(6), 2.0);
        assert_eq!(policy.delay(0), Duration::from_secs(2));
        assert_eq!(policy.delay(1), Duration::from_secs(4));
        assert_eq!(policy.delay(2), Duration::from_secs(6)); // 8s capped at 6s
    }

    /// **Scenario**: jitter adds at most the configured slack on top of the base delay.
    #[test]
    fn jittered_delay_stays_within_bounds() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(200));
        for attempt in 0..3 {
            let d = policy.jittered_delay(attempt, Duration::from_millis(100));
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(300));
        }
    }
}
