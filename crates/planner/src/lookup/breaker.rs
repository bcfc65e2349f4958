//! Fail-fast guard for an upstream service that keeps erroring.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::error::LookupError;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    /// Set once the threshold is reached; calls are refused until then
    open_until: Option<Instant>,
}

/// Refuses calls for a cooldown period after `threshold` consecutive
/// retryable failures.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: threshold.max(1),
            cooldown,
        }
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails fast with [`LookupError::CircuitBreakerOpen`] during the cooldown.
    /// The first call after it lets a request through again.
    pub fn check(&self) -> Result<(), LookupError> {
        let mut state = self.state();
        match state.open_until {
            Some(until) if Instant::now() < until => Err(LookupError::CircuitBreakerOpen),
            Some(_) => {
                *state = BreakerState::default();
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Records the outcome of a call. Only retryable errors count as failures.
    pub fn record<T>(&self, result: &Result<T, LookupError>) {
        let mut state = self.state();
        match result {
            Ok(_) => *state = BreakerState::default(),
            Err(e) if e.is_retryable() => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                if state.consecutive_failures >= self.threshold {
                    state.open_until = Some(Instant::now() + self.cooldown);
                }
            }
            Err(_) => {}
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.state().consecutive_failures
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> Result<(), LookupError> {
        Err(LookupError::Timeout {
            message: "15s".to_string(),
        })
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60));

        cb.record(&timeout());
        assert!(cb.check().is_ok());
        cb.record(&timeout());
        assert!(matches!(cb.check(), Err(LookupError::CircuitBreakerOpen)));
        assert_eq!(cb.failure_count(), 2);

        cb.record(&Ok::<(), LookupError>(()));
        assert!(cb.check().is_ok());
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_only_retryable_errors_count() {
        let cb = CircuitBreaker::new(1, Duration::from_secs(60));
        cb.record::<()>(&Err(LookupError::InvalidRequest {
            message: "blank name".to_string(),
        }));
        assert!(cb.check().is_ok());

        cb.record(&timeout());
        assert!(cb.check().is_err());
    }

    #[test]
    fn test_closes_after_cooldown() {
        let cb = CircuitBreaker::new(1, Duration::ZERO);
        cb.record(&timeout());

        assert!(cb.check().is_ok());
        assert_eq!(cb.failure_count(), 0);
    }
}
