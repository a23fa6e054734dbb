//! Vendor client error types.

use thiserror::Error;

pub type VendorResult<T> = Result<T, VendorError>;

#[derive(Debug, Error)]
pub enum VendorError {
    #[error("Missing API key: {0} not set")]
    MissingApiKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited by vendor: {0}")]
    RateLimited(String),

    #[error("Vendor returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VendorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            429 => Self::RateLimited(body),
            _ => Self::Http { status, body },
        }
    }

    /// HTTP status code, if the error came from a vendor response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            VendorError::RateLimited(_) => Some(429),
            VendorError::Http { status, .. } => Some(*status),
            VendorError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if a repeated request could succeed.
    ///
    /// 404 counts as retryable: several vendors answer 404 for a job that
    /// is not yet visible on their status endpoint.
    pub fn is_retryable(&self) -> bool {
        match self {
            VendorError::Network(_)
            | VendorError::RateLimited(_)
            | VendorError::InvalidResponse(_)
            | VendorError::Json(_) => true,
            VendorError::Http { status, .. } => *status == 404 || *status >= 500,
            VendorError::MissingApiKey(_) | VendorError::Config(_) => false,
        }
    }
}
