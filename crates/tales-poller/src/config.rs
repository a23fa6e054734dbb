//! Poll timing configuration.

use std::time::Duration;

use crate::error::{PollError, PollResult};

/// Timing for one wait: flat interval between checks and a total deadline.
///
/// Only built through validating constructors, so both durations are
/// always non-zero:
///
/// ```compile_fail
/// use std::time::Duration;
/// let config = tales_poller::PollConfig {
///     poll_interval: Duration::ZERO,
///     max_wait: Duration::from_secs(1),
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    poll_interval: Duration,
    max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl PollConfig {
    /// Create a validated config. Both durations must be non-zero.
    pub fn new(poll_interval: Duration, max_wait: Duration) -> PollResult<Self> {
        let config = Self {
            poll_interval,
            max_wait,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create from fractional seconds, as vendor call sites usually state them.
    pub fn from_secs_f64(poll_interval_secs: f64, max_wait_secs: f64) -> PollResult<Self> {
        let poll_interval = Duration::try_from_secs_f64(poll_interval_secs).map_err(|_| {
            PollError::invalid_config(format!("poll_interval {}s", poll_interval_secs))
        })?;
        let max_wait = Duration::try_from_secs_f64(max_wait_secs)
            .map_err(|_| PollError::invalid_config(format!("max_wait {}s", max_wait_secs)))?;
        Self::new(poll_interval, max_wait)
    }

    /// Delay between status checks.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Total wait budget for one job.
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn validate(&self) -> PollResult<()> {
        if self.poll_interval.is_zero() {
            return Err(PollError::invalid_config("poll_interval must be > 0"));
        }
        if self.max_wait.is_zero() {
            return Err(PollError::invalid_config("max_wait must be > 0"));
        }
        Ok(())
    }

    /// Upper bound on status checks for one wait.
    pub fn max_checks(&self) -> u64 {
        let interval = self.poll_interval.as_nanos().max(1);
        (self.max_wait.as_nanos().div_ceil(interval) as u64).saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.max_wait(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_rejected() {
        assert!(matches!(
            PollConfig::new(Duration::ZERO, Duration::from_secs(5)),
            Err(PollError::InvalidConfig(_))
        ));
        assert!(matches!(
            PollConfig::new(Duration::from_secs(1), Duration::ZERO),
            Err(PollError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_secs_f64() {
        let config = PollConfig::from_secs_f64(2.5, 30.0).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.max_wait(), Duration::from_secs(30));

        assert!(PollConfig::from_secs_f64(-1.0, 30.0).is_err());
        assert!(PollConfig::from_secs_f64(1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_max_checks() {
        let config = PollConfig::new(Duration::from_secs(1), Duration::from_secs(3)).unwrap();
        assert_eq!(config.max_checks(), 4);
    }
}
