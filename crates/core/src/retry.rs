//! Retry logic with exponential backoff
//!
//! Used for network work such as release downloads. Verification failures
//! are not retried; callers only wrap the transport step.
//!
//! # Example
//!
//! ```rust,no_run
//! use tatari_hooks_core::retry::{retry, RetryConfig};
//!
//! let result = retry(RetryConfig::default(), || {
//!     // Potentially flaky operation
//!     Ok::<_, std::io::Error>("success")
//! });
//! ```

use crate::error::{Error, Result};
use std::thread;
use std::time::{Duration, Instant};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (at least one is always made)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Config for release downloads
    pub fn download() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Create a config with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Calculate delay for a given attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.jitter {
            // Add up to 25% jitter
            let jitter_factor = 1.0 + (rand_simple() * 0.25);
            delay_secs * jitter_factor
        } else {
            delay_secs
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// Simple pseudo-random number generator (0.0 to 1.0)
fn rand_simple() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u32(nanos);
    (hasher.finish() % 1000) as f64 / 1000.0
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

/// Execute a function with retry logic, returning the last error on exhaustion
pub fn retry<F, T, E>(config: RetryConfig, mut f: F) -> std::result::Result<RetryResult<T>, E>
where
    F: FnMut() -> std::result::Result<T, E>,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            thread::sleep(config.delay_for_attempt(attempt));
        }

        match f() {
            Ok(value) => {
                return Ok(RetryResult {
                    value,
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                });
            }
            Err(e) if attempt + 1 >= max_attempts => return Err(e),
            Err(_) => attempt += 1,
        }
    }
}

/// Execute with retry, wrapping the final failure as a network error
pub fn retry_operation<F, T>(config: RetryConfig, operation_name: &str, f: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = config.max_attempts.max(1);
    match retry(config, f) {
        Ok(result) => Ok(result.value),
        Err(e) => Err(Error::network(format!(
            "{} failed after {} attempts: {}",
            operation_name, attempts, e.message
        ))
        .with_source(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_retry_success_first_attempt() {
        let config = RetryConfig::default();
        let result = retry(config, || Ok::<_, &str>("success")).unwrap();

        assert_eq!(result.value, "success");
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn test_retry_success_after_failures() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        };

        let mut attempt = 0;
        let result = retry(config, || {
            attempt += 1;
            if attempt < 3 {
                Err("not yet")
            } else {
                Ok("success")
            }
        })
        .unwrap();

        assert_eq!(result.value, "success");
        assert_eq!(result.attempts, 3);
    }

    #[test]
    fn test_retry_all_failures_returns_last_error() {
        let config = RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        };

        let mut calls = 0;
        let result = retry(config, || {
            calls += 1;
            Err::<(), _>(calls)
        });
        assert_eq!(result.unwrap_err(), 2);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::no_retry()
        };
        let mut calls = 0;
        let _ = retry(config, || {
            calls += 1;
            Err::<(), _>("nope")
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_retry_operation_wraps_as_network_error() {
        let err = retry_operation(RetryConfig::no_retry(), "download", || {
            Err::<(), _>(Error::io("connection reset"))
        })
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(err.message.contains("download failed after 1 attempts"));
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }
}
