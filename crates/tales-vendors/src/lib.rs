//! HTTP adapters for generative-AI vendor job APIs.
//!
//! Each vendor exposes the same shape: submit a generation, get a job id,
//! poll a status endpoint. [`VendorClient`] implements
//! [`tales_poller::StatusCheck`] so it plugs straight into the poller.

pub mod client;
pub mod config;
pub mod error;
pub mod mapping;

#[cfg(test)]
mod client_tests;

pub use client::VendorClient;
pub use config::VendorConfig;
pub use error::{VendorError, VendorResult};
pub use mapping::StatusMapping;
