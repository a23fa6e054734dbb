//! Worker configuration.

use std::time::Duration;

use tales_models::Vendor;
use tales_poller::PollConfig;

use crate::error::{WorkerError, WorkerResult};

/// Share of a batch that must succeed before the pipeline moves on.
pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 0.8;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay between status checks
    pub poll_interval: Duration,
    /// Wait budget per job
    pub max_wait: Duration,
    /// Fraction of a batch that must succeed (0.0..=1.0)
    pub success_threshold: f64,
    /// In-flight jobs per vendor; the vendor default when unset
    pub max_in_flight: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300), // 5 minutes
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            max_in_flight: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();

        let config = Self {
            poll_interval: env_secs("TALES_POLL_INTERVAL_SECS")?.unwrap_or(defaults.poll_interval),
            max_wait: env_secs("TALES_MAX_WAIT_SECS")?.unwrap_or(defaults.max_wait),
            success_threshold: env_parse("TALES_SUCCESS_THRESHOLD")?
                .unwrap_or(defaults.success_threshold),
            max_in_flight: env_parse("TALES_MAX_IN_FLIGHT")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if !(0.0..=1.0).contains(&self.success_threshold) {
            return Err(WorkerError::config_error(format!(
                "success threshold must be within 0..=1, got {}",
                self.success_threshold
            )));
        }
        if self.max_in_flight == Some(0) {
            return Err(WorkerError::config_error("max in-flight jobs must be positive"));
        }
        self.poll_config()?;
        Ok(())
    }

    /// Poll timing derived from this config.
    pub fn poll_config(&self) -> WorkerResult<PollConfig> {
        Ok(PollConfig::new(self.poll_interval, self.max_wait)?)
    }

    /// In-flight limit for a vendor.
    pub fn max_in_flight_for(&self, vendor: Vendor) -> usize {
        self.max_in_flight
            .unwrap_or_else(|| vendor.default_max_in_flight())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> WorkerResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| WorkerError::config_error(format!("{} has an invalid value: {}", key, raw))),
        _ => Ok(None),
    }
}

fn env_secs(key: &str) -> WorkerResult<Option<Duration>> {
    match env_parse::<f64>(key)? {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| WorkerError::config_error(format!("{} must be a non-negative number", key))),
        None => Ok(None),
    }
}
