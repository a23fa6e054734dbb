//! Shared data models for the Tales generation backend.
//!
//! This crate provides Serde-serializable types for:
//! - Vendor jobs and their lifecycle status
//! - Status samples and terminal outcomes of polling
//! - Vendors and the media they produce

pub mod job;
pub mod job_status;
pub mod outcome;
pub mod vendor;

// Re-export common types
pub use job::{Job, JobId, TransitionError};
pub use job_status::{JobSnapshot, JobStatus};
pub use outcome::{Outcome, StatusSample};
pub use vendor::{MediaKind, UnknownVendor, Vendor};
