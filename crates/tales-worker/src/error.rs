//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Batch below threshold: {0}")]
    BelowThreshold(String),

    #[error("Poll error: {0}")]
    Poll(#[from] tales_poller::PollError),

    #[error("Vendor error: {0}")]
    Vendor(#[from] tales_vendors::VendorError),

    #[error("Unknown vendor: {0}")]
    UnknownVendor(#[from] tales_models::UnknownVendor),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn below_threshold(msg: impl Into<String>) -> Self {
        Self::BelowThreshold(msg.into())
    }
}
