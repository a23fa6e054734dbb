//! Structured job logging utilities.

use tracing::{error, info, warn, Span};

use tales_models::{JobId, Outcome, Vendor};

/// Job logger carrying the job id and vendor on every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    vendor: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, vendor: Vendor) -> Self {
        Self {
            job_id: job_id.to_string(),
            vendor: vendor.as_str().to_string(),
        }
    }

    /// Logger for work that has no vendor job id yet (e.g. a pending submit).
    pub fn unsubmitted(index: usize, vendor: Vendor) -> Self {
        Self {
            job_id: format!("#{}", index),
            vendor: vendor.as_str().to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, vendor = %self.vendor, "Job started: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, vendor = %self.vendor, "Job warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, vendor = %self.vendor, "Job error: {}", message);
    }

    /// Log a terminal outcome at the level it deserves.
    pub fn log_outcome<T, E: std::fmt::Display>(&self, outcome: &Outcome<T, E>) {
        match outcome {
            Outcome::Success(_) => {
                info!(job_id = %self.job_id, vendor = %self.vendor, "Job completed")
            }
            Outcome::Failure(reason) => self.log_error(&reason.to_string()),
            Outcome::TimedOut => self.log_warning("timed out waiting for vendor"),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, vendor = %self.vendor)
    }
}
