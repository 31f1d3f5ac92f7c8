//! Retry policy and response classification for tile requests.
//!
//! # Classification
//!
//! | Outcome                            | Class       |
//! |------------------------------------|-------------|
//! | 2xx                                | success     |
//! | 408, 429, 5xx                      | transient   |
//! | timeout, connect/body error        | transient   |
//! | other 4xx, 1xx, 3xx                | permanent   |

use std::time::Duration;

use crate::provider::TransportError;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (500ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How a tile request handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// No retries - fail immediately on error.
    None,

    /// Fixed number of attempts with constant delay between them.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay between retry attempts.
        delay: Duration,
    },

    /// Exponential backoff: the delay grows by `multiplier` after each failed
    /// attempt, up to `max_delay`.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Maximum delay cap.
        max_delay: Duration,
        /// Multiplier applied to delay after each failure.
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Creates an exponential backoff policy allowing `max_retries` retries
    /// after the first attempt.
    ///
    /// Uses a 500ms initial delay ([`DEFAULT_INITIAL_DELAY_MS`]), doubling
    /// each time, capped at 30 seconds.
    pub fn exponential(max_retries: u32) -> Self {
        Self::ExponentialBackoff {
            max_attempts: max_retries.saturating_add(1),
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Creates a fixed retry policy.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum number of attempts (including initial)
    /// * `delay` - Fixed delay between attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Calculates the delay before the next attempt.
    ///
    /// # Arguments
    ///
    /// * `attempt` - Number of attempts already made and failed (1-based)
    ///
    /// # Returns
    ///
    /// The delay to wait before retrying, or `None` if no more retries are allowed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay_ms = (initial_delay.as_millis() as f64 * factor)
                    .min(max_delay.as_millis() as f64);
                Some(Duration::from_millis(delay_ms as u64).min(*max_delay))
            }
        }
    }

    /// Returns the maximum number of attempts for this policy.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => *max_attempts,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Classifies a non-success HTTP status.
pub fn classify_status(status: u16) -> FailureClass {
    match status {
        408 | 429 => FailureClass::Transient,
        500..=599 => FailureClass::Transient,
        _ => FailureClass::Permanent,
    }
}

/// Classifies a transport-level failure. All of them are transient.
pub fn classify_transport(_error: &TransportError) -> FailureClass {
    FailureClass::Transient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_three_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::exponential(3);

        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(2000)));
        assert_eq!(policy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_exponential_capped() {
        let policy = RetryPolicy::ExponentialBackoff {
            max_attempts: 20,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        };

        assert_eq!(policy.delay_for_attempt(10), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(10)));
        assert_eq!(policy.delay_for_attempt(2), None);
    }

    #[test]
    fn test_none_policy() {
        assert_eq!(RetryPolicy::None.max_attempts(), 1);
        assert_eq!(RetryPolicy::None.delay_for_attempt(1), None);
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy::exponential(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for_attempt(1), None);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(500), FailureClass::Transient);
        assert_eq!(classify_status(503), FailureClass::Transient);
        assert_eq!(classify_status(429), FailureClass::Transient);
        assert_eq!(classify_status(408), FailureClass::Transient);
        assert_eq!(classify_status(404), FailureClass::Permanent);
        assert_eq!(classify_status(403), FailureClass::Permanent);
        assert_eq!(classify_status(304), FailureClass::Permanent);
    }

    #[test]
    fn test_transport_errors_are_transient() {
        assert_eq!(
            classify_transport(&TransportError::Timeout),
            FailureClass::Transient
        );
        assert_eq!(
            classify_transport(&TransportError::Connect("reset".into())),
            FailureClass::Transient
        );
    }
}
