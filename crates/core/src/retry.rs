//! Retry policy with fixed or exponential backoff
//!
//! Used by the rich HTTP client to re-attempt failed dispatches:
//! - Fixed delay by default, exponential when a multiplier is set
//! - Delays capped at `max_delay`
//! - Caller decides which errors are worth another attempt
//!
//! # Example
//!
//! ```rust,no_run
//! use forge_core::retry::{retry, RetryConfig};
//!
//! # async fn run() {
//! let result = retry(&RetryConfig::default(), |_: &&str| true, |_attempt| async {
//!     Ok::<_, &str>("success")
//! })
//! .await;
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Whether failed attempts are retried at all
    pub enabled: bool,
    /// Additional attempts after the first one
    pub retry_count: u32,
    /// Delay before the first retry
    #[serde(with = "duration_ms")]
    pub retry_delay: Duration,
    /// Multiplier applied to the delay on each further retry
    pub backoff_multiplier: f64,
    /// Maximum delay between retries
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_count: 3,
            retry_delay: Duration::from_millis(1000),
            backoff_multiplier: 1.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl RetryConfig {
    /// Create a config with no retries
    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            retry_count: 0,
            retry_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Fixed-delay policy with the given count and delay
    pub fn fixed(retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            retry_count,
            retry_delay,
            ..Self::default()
        }
    }

    /// Builder-style method to enable exponential backoff
    #[must_use]
    pub fn with_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff_multiplier = multiplier;
        self.max_delay = max_delay;
        self
    }

    /// Total number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.retry_count.saturating_add(1)
        } else {
            1
        }
    }

    /// Calculate delay for a given attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_ms = self.retry_delay.as_millis() as f64;
        let cap_ms = self.max_delay.as_millis().max(self.retry_delay.as_millis()) as f64;
        let delay_ms = (base_ms * self.backoff_multiplier.max(1.0).powi(exponent)).min(cap_ms);

        Duration::from_millis(delay_ms.round() as u64)
    }
}

/// Retry result with attempt information
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub value: T,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent retrying
    pub total_duration: Duration,
}

/// Execute an async operation with retry logic
///
/// `should_retry` decides whether a failure is worth another attempt; the
/// operation receives the zero-based attempt number. The last error is
/// returned once attempts are exhausted or a failure is not retryable.
pub async fn retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<RetryResult<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts();
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt);
            debug!(attempt, delay_ms = delay.as_millis(), "Retrying after delay");
            tokio::time::sleep(delay).await;
        }

        match operation(attempt).await {
            Ok(value) => {
                return Ok(RetryResult {
                    value,
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                });
            }
            Err(e) => {
                if attempt + 1 < max_attempts && should_retry(&e) {
                    debug!(attempt = attempt + 1, error = %e, "Attempt failed, will retry");
                    attempt += 1;
                } else {
                    debug!(attempt = attempt + 1, error = %e, "Attempt failed, not retrying");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(retry_count: u32) -> RetryConfig {
        RetryConfig::fixed(retry_count, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = retry(&RetryConfig::default(), |_: &&str| true, |_| async {
            Ok::<_, &str>("success")
        })
        .await
        .unwrap();

        assert_eq!(result.value, "success");
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let calls = Cell::new(0);
        let result = retry(&fast(3), |_: &&str| true, |_| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err("not yet") } else { Ok("success") } }
        })
        .await
        .unwrap();

        assert_eq!(result.value, "success");
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_exhausts_all_attempts() {
        let calls = Cell::new(0);
        let result = retry(&fast(3), |_: &&str| true, |_| {
            calls.set(calls.get() + 1);
            async { Err::<(), _>("always fails") }
        })
        .await;

        assert_eq!(result.unwrap_err(), "always fails");
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Cell::new(0);
        let result = retry(&fast(3), |_: &&str| false, |_| {
            calls.set(calls.get() + 1);
            async { Err::<(), _>("fatal") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_disabled_policy_makes_one_attempt() {
        let calls = Cell::new(0);
        let config = RetryConfig {
            enabled: false,
            ..fast(5)
        };
        let _ = retry(&config, |_: &&str| true, |_| {
            calls.set(calls.get() + 1);
            async { Err::<(), _>("nope") }
        })
        .await;

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_fixed_delay_calculation() {
        let config = RetryConfig::fixed(3, Duration::from_millis(250));

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(250));
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let config = RetryConfig::fixed(5, Duration::from_millis(100))
            .with_backoff(2.0, Duration::from_millis(300));

        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(300));
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryConfig::default().max_attempts(), 4);
        assert_eq!(RetryConfig::no_retry().max_attempts(), 1);
    }

    #[test]
    fn test_config_roundtrips_millis() {
        let json = serde_json::to_value(RetryConfig::default()).unwrap();
        assert_eq!(json["retryDelay"], 1000);
        assert_eq!(json["retryCount"], 3);
    }
}
