//! Status samples and terminal outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One answer from a vendor status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum StatusSample<T, E = String> {
    /// The vendor is still working on the job
    Running,
    /// The vendor signalled completion
    Completed(T),
    /// The vendor signalled failure
    Failed(E),
}

impl<T, E> StatusSample<T, E> {
    pub fn is_running(&self) -> bool {
        matches!(self, StatusSample::Running)
    }
}

/// Terminal result of waiting on a job.
///
/// Callers must handle all three cases; a vendor failure and an exhausted
/// wait budget are reported as values, never as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome<T, E = String> {
    /// Payload passed through unchanged
    Success(T),
    /// Vendor failure reason passed through unchanged
    Failure(E),
    /// No terminal signal before the deadline
    TimedOut,
}

impl<T, E> Outcome<T, E> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Failure(_) => "failure",
            Outcome::TimedOut => "timed_out",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }

    /// Borrow the payload of a successful outcome.
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(payload) => Some(payload),
            _ => None,
        }
    }

    /// Take the payload of a successful outcome.
    pub fn into_success(self) -> Option<T> {
        match self {
            Outcome::Success(payload) => Some(payload),
            _ => None,
        }
    }

    /// Borrow the reason of a failed outcome.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Outcome::Failure(reason) => Some(reason),
            _ => None,
        }
    }

    /// Transform the success payload, leaving failures and timeouts as-is.
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(payload) => Outcome::Success(f(payload)),
            Outcome::Failure(reason) => Outcome::Failure(reason),
            Outcome::TimedOut => Outcome::TimedOut,
        }
    }
}

impl<T, E> std::fmt::Display for Outcome<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
