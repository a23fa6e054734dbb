//! Log budget for transient status-check failures.

use tracing::{debug, warn};

/// Counts swallowed status-check failures within one wait.
///
/// A vendor outage produces one failure per tick. The first `log_budget`
/// failures in a row are reported; the rest are counted silently until a
/// check gets an answer from the vendor again.
#[derive(Debug, Default)]
pub struct FailureTracker {
    streak: u32,
    total: u32,
    log_budget: u32,
    quiet: bool,
}

impl FailureTracker {
    pub fn new(log_budget: u32) -> Self {
        Self {
            log_budget,
            ..Default::default()
        }
    }

    /// The vendor answered; end the current failure streak.
    pub fn record_success(&mut self) {
        if self.quiet {
            debug!(streak = self.streak, "Vendor reachable again after silent failures");
        }
        self.streak = 0;
        self.quiet = false;
    }

    /// Count a failure. Returns whether the caller should log it.
    pub fn record_failure(&mut self) -> bool {
        self.streak += 1;
        self.total += 1;

        if self.streak <= self.log_budget {
            return true;
        }
        if !self.quiet {
            self.quiet = true;
            warn!(
                budget = self.log_budget,
                "Status checks keep failing; counting further failures silently"
            );
        }
        false
    }

    /// Length of the current failure streak.
    pub fn failure_count(&self) -> u32 {
        self.streak
    }

    /// Failures over the whole wait, across streaks.
    pub fn total_failures(&self) -> u32 {
        self.total
    }
}
