//! Poller metrics.
//!
//! Counters and histograms are recorded through the `metrics` facade; they
//! are no-ops until a binary installs a recorder.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Status-check calls by poller label.
    pub const CHECKS_TOTAL: &str = "tales_poll_checks_total";

    /// Swallowed transport failures by poller label.
    pub const TRANSIENT_ERRORS_TOTAL: &str = "tales_poll_transient_errors_total";

    /// Terminal outcomes by poller label and outcome.
    pub const OUTCOMES_TOTAL: &str = "tales_poll_outcomes_total";

    /// Time from first check to terminal outcome, in seconds.
    pub const WAIT_SECONDS: &str = "tales_poll_wait_seconds";

    /// Jobs currently holding a limiter permit.
    pub const JOBS_IN_FLIGHT: &str = "tales_jobs_in_flight";
}

pub fn record_check(label: &str) {
    counter!(names::CHECKS_TOTAL, "poller" => label.to_string()).increment(1);
}

pub fn record_transient_error(label: &str) {
    counter!(names::TRANSIENT_ERRORS_TOTAL, "poller" => label.to_string()).increment(1);
}

pub fn record_outcome(label: &str, outcome: &str, wait_secs: f64) {
    counter!(
        names::OUTCOMES_TOTAL,
        "poller" => label.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(names::WAIT_SECONDS, "poller" => label.to_string()).record(wait_secs);
}

pub fn set_in_flight(label: &str, count: usize) {
    gauge!(names::JOBS_IN_FLIGHT, "limiter" => label.to_string()).set(count as f64);
}
