//! Batch generation worker.
//!
//! This crate provides:
//! - Batch fan-out over vendor jobs with success-threshold and fallback policy
//! - Worker configuration from the environment
//! - Structured job logging

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;

pub use batch::{with_fallback, BatchItem, BatchReport, BatchRunner};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
