//! Generic job poller for async vendor generation APIs.
//!
//! This crate provides:
//! - The [`StatusCheck`] capability each vendor integration implements
//! - [`JobPoller`] / [`await_completion`]: submit once, poll at a flat
//!   interval, return a three-way [`tales_models::Outcome`]
//! - [`JobLimiter`] to bound in-flight jobs per vendor
//! - [`JobStore`] for looking up job progress from any task

pub mod check;
pub mod config;
pub mod error;
pub mod limiter;
pub mod metrics;
pub mod poller;
pub mod store;
pub mod tracker;

pub use check::{status_fn, FnStatusCheck, StatusCheck};
pub use config::PollConfig;
pub use error::{PollError, PollResult, SubmitError};
pub use limiter::JobLimiter;
pub use poller::{await_completion, JobPoller};
pub use store::JobStore;
pub use tracker::FailureTracker;
