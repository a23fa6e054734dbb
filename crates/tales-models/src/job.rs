//! Job record for one outstanding unit of vendor work.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::job_status::{JobSnapshot, JobStatus};
use crate::outcome::Outcome;
use crate::vendor::Vendor;

/// Opaque identifier returned by a vendor on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID (used for locally tracked work).
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Vendor ids are opaque, but never blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Rejected status transition. The job is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// A submitted vendor job as seen by the poller.
///
/// `result` is only set once the job is [`JobStatus::Completed`] and `error`
/// only once it is [`JobStatus::Failed`]; both stay empty while the job is
/// pending or running.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job<T, E = String> {
    /// Vendor-assigned job ID
    pub job_id: JobId,

    /// Vendor that owns the job, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,

    /// Creation timestamp
    pub submitted_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<E>,

    attempts: u32,

    #[serde(default)]
    transient_errors: u32,
}

impl<T, E> Job<T, E> {
    /// Create a pending job for a freshly submitted vendor id.
    pub fn new(job_id: impl Into<JobId>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            vendor: None,
            submitted_at: now,
            updated_at: now,
            status: JobStatus::Pending,
            result: None,
            error: None,
            attempts: 0,
            transient_errors: 0,
        }
    }

    /// Tag the job with the vendor that owns it.
    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    /// Number of status-check calls made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of status checks that failed at the transport level.
    pub fn transient_errors(&self) -> u32 {
        self.transient_errors
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending -> Running. Calling it again while running is a no-op.
    pub fn mark_running(&mut self) -> Result<(), TransitionError> {
        match self.status {
            JobStatus::Pending => {
                self.transition(JobStatus::Running);
                Ok(())
            }
            JobStatus::Running => Ok(()),
            from => Err(TransitionError {
                from,
                to: JobStatus::Running,
            }),
        }
    }

    /// Count one status-check call.
    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
        self.updated_at = Utc::now();
    }

    /// Count one swallowed transport failure.
    pub fn record_transient_error(&mut self) {
        self.transient_errors = self.transient_errors.saturating_add(1);
        self.updated_at = Utc::now();
    }

    /// Running -> Completed with the vendor payload.
    pub fn complete(&mut self, payload: T) -> Result<(), TransitionError> {
        self.require_running(JobStatus::Completed)?;
        self.result = Some(payload);
        self.transition(JobStatus::Completed);
        Ok(())
    }

    /// Running -> Failed with the vendor-reported reason.
    pub fn fail(&mut self, reason: E) -> Result<(), TransitionError> {
        self.require_running(JobStatus::Failed)?;
        self.error = Some(reason);
        self.transition(JobStatus::Failed);
        Ok(())
    }

    /// Pending | Running -> TimedOut once the wait budget is spent.
    pub fn time_out(&mut self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::TimedOut,
            });
        }
        self.transition(JobStatus::TimedOut);
        Ok(())
    }

    /// Terminal outcome of a finished job, `None` while still active.
    pub fn outcome(&self) -> Option<Outcome<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match self.status {
            JobStatus::Completed => self.result.clone().map(Outcome::Success),
            JobStatus::Failed => self.error.clone().map(Outcome::Failure),
            JobStatus::TimedOut => Some(Outcome::TimedOut),
            JobStatus::Pending | JobStatus::Running => None,
        }
    }

    /// Consume the job into its terminal outcome.
    pub fn into_outcome(self) -> Option<Outcome<T, E>> {
        match self.status {
            JobStatus::Completed => self.result.map(Outcome::Success),
            JobStatus::Failed => self.error.map(Outcome::Failure),
            JobStatus::TimedOut => Some(Outcome::TimedOut),
            JobStatus::Pending | JobStatus::Running => None,
        }
    }

    /// Non-generic view for the job store.
    pub fn snapshot(&self) -> JobSnapshot
    where
        E: fmt::Display,
    {
        JobSnapshot {
            job_id: self.job_id.clone(),
            vendor: self.vendor,
            status: self.status,
            attempts: self.attempts,
            transient_errors: self.transient_errors,
            error_message: self.error.as_ref().map(|e| e.to_string()),
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
        }
    }

    fn require_running(&self, to: JobStatus) -> Result<(), TransitionError> {
        if self.status == JobStatus::Running {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.status,
                to,
            })
        }
    }

    fn transition(&mut self, to: JobStatus) {
        self.status = to;
        self.updated_at = Utc::now();
    }
}
