//! Poller error types.
//!
//! Only caller mistakes surface as errors. Vendor failures, transport
//! hiccups and deadlines are all reported through [`tales_models::Outcome`].

use thiserror::Error;

pub type PollResult<T> = Result<T, PollError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Job ID must not be empty")]
    EmptyJobId,

    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(String),
}

impl PollError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Failure to get a job in flight through a [`crate::JobLimiter`].
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    #[error("Submission failed: {0}")]
    Submit(E),

    #[error("Job limiter closed")]
    LimiterClosed,

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl<E> SubmitError<E> {
    /// The vendor-side submission error, if that is what failed.
    pub fn submit_error(&self) -> Option<&E> {
        match self {
            SubmitError::Submit(e) => Some(e),
            _ => None,
        }
    }
}
