//! Batch fan-out over vendor jobs.
//!
//! A pipeline stage submits several generations at once (one clip per
//! scene, a few candidate tracks), waits for all of them through a shared
//! [`JobLimiter`], then decides whether enough succeeded to continue.

use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, Instrument};

use tales_models::{JobId, Outcome, Vendor};
use tales_poller::{JobLimiter, JobPoller, StatusCheck, SubmitError};

use crate::logging::JobLogger;

/// Result of one batch entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchItem<T, E = String> {
    /// The job was submitted and polled to a terminal outcome.
    Finished {
        index: usize,
        job_id: JobId,
        outcome: Outcome<T, E>,
    },
    /// The job never got a vendor id.
    SubmitFailed { index: usize, error: String },
}

impl<T, E> BatchItem<T, E> {
    pub fn index(&self) -> usize {
        match self {
            BatchItem::Finished { index, .. } | BatchItem::SubmitFailed { index, .. } => *index,
        }
    }

    pub fn outcome(&self) -> Option<&Outcome<T, E>> {
        match self {
            BatchItem::Finished { outcome, .. } => Some(outcome),
            BatchItem::SubmitFailed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome().map_or(false, Outcome::is_success)
    }
}

/// Outcomes of a batch, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<T, E = String> {
    items: Vec<BatchItem<T, E>>,
}

impl<T, E> BatchReport<T, E> {
    pub fn new(mut items: Vec<BatchItem<T, E>>) -> Self {
        items.sort_by_key(BatchItem::index);
        Self { items }
    }

    pub fn items(&self) -> &[BatchItem<T, E>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<BatchItem<T, E>> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Successful payloads, in submission order.
    pub fn successes(&self) -> Vec<&T> {
        self.items
            .iter()
            .filter_map(|item| item.outcome().and_then(Outcome::success))
            .collect()
    }

    /// Vendor-reported failure reasons.
    pub fn failures(&self) -> Vec<&E> {
        self.items
            .iter()
            .filter_map(|item| item.outcome().and_then(Outcome::failure))
            .collect()
    }

    pub fn timed_out(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome().map_or(false, Outcome::is_timed_out))
            .count()
    }

    pub fn submit_failures(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, BatchItem::SubmitFailed { .. }))
            .count()
    }

    /// First successful payload in submission order.
    pub fn first_success(&self) -> Option<&T> {
        self.items
            .iter()
            .find_map(|item| item.outcome().and_then(Outcome::success))
    }

    /// Fraction of entries that succeeded. An empty batch scores zero.
    pub fn success_ratio(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        let successes = self.items.iter().filter(|item| item.is_success()).count();
        successes as f64 / self.items.len() as f64
    }

    pub fn meets_threshold(&self, threshold: f64) -> bool {
        !self.items.is_empty() && self.success_ratio() >= threshold
    }
}

/// Resolve a non-success outcome to a degraded value.
pub fn with_fallback<T, E>(outcome: Outcome<T, E>, fallback: T) -> T {
    outcome.into_success().unwrap_or(fallback)
}

/// Runs batches of jobs for one vendor through a shared limiter.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    vendor: Vendor,
    limiter: JobLimiter,
    poller: JobPoller,
}

impl BatchRunner {
    pub fn new(vendor: Vendor, limiter: JobLimiter, poller: JobPoller) -> Self {
        Self {
            vendor,
            limiter,
            poller,
        }
    }

    pub fn limiter(&self) -> &JobLimiter {
        &self.limiter
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Submit every request and wait for all of them.
    ///
    /// Each submission runs under a limiter permit held until its poller
    /// finishes. A failed submission becomes [`BatchItem::SubmitFailed`]
    /// and does not affect the rest of the batch.
    pub async fn submit_all<I, S, Fut, SE, C>(
        &self,
        submissions: I,
        check: &C,
    ) -> BatchReport<C::Payload, C::Reason>
    where
        I: IntoIterator<Item = S>,
        S: FnOnce() -> Fut,
        Fut: Future<Output = Result<JobId, SE>>,
        SE: Display,
        C: StatusCheck + ?Sized,
    {
        let tasks = submissions
            .into_iter()
            .enumerate()
            .map(|(index, submit)| self.submit_one(index, submit, check));

        let report = BatchReport::new(join_all(tasks).await);
        self.log_summary(&report);
        report
    }

    /// Wait for jobs that were already submitted.
    pub async fn await_all<C>(&self, job_ids: &[JobId], check: &C) -> BatchReport<C::Payload, C::Reason>
    where
        C: StatusCheck + ?Sized,
    {
        let tasks = job_ids.iter().enumerate().map(|(index, job_id)| async move {
            let logger = JobLogger::new(job_id, self.vendor);
            let span = logger.create_span();

            let result = self
                .limiter
                .run(async {
                    logger.log_start("waiting for vendor");
                    self.poller.try_await_completion(job_id, check).await
                })
                .instrument(span)
                .await;

            match result {
                Some(Ok(outcome)) => {
                    logger.log_outcome(&outcome);
                    BatchItem::Finished {
                        index,
                        job_id: job_id.clone(),
                        outcome,
                    }
                }
                Some(Err(e)) => {
                    logger.log_error(&e.to_string());
                    BatchItem::SubmitFailed {
                        index,
                        error: e.to_string(),
                    }
                }
                None => BatchItem::SubmitFailed {
                    index,
                    error: SubmitError::<String>::LimiterClosed.to_string(),
                },
            }
        });

        let report = BatchReport::new(join_all(tasks).await);
        self.log_summary(&report);
        report
    }

    async fn submit_one<S, Fut, SE, C>(
        &self,
        index: usize,
        submit: S,
        check: &C,
    ) -> BatchItem<C::Payload, C::Reason>
    where
        S: FnOnce() -> Fut,
        Fut: Future<Output = Result<JobId, SE>>,
        SE: Display,
        C: StatusCheck + ?Sized,
    {
        let mut submitted: Option<JobId> = None;
        let slot = &mut submitted;

        let result = self
            .limiter
            .submit_and_wait(
                &self.poller,
                move || async move {
                    match submit().await {
                        Ok(job_id) => {
                            *slot = Some(job_id.clone());
                            Ok(job_id)
                        }
                        Err(e) => Err(e),
                    }
                },
                check,
            )
            .await;

        match (result, submitted) {
            (Ok(outcome), Some(job_id)) => {
                JobLogger::new(&job_id, self.vendor).log_outcome(&outcome);
                BatchItem::Finished {
                    index,
                    job_id,
                    outcome,
                }
            }
            (Ok(_), None) => BatchItem::SubmitFailed {
                index,
                error: "job finished without a vendor id".to_string(),
            },
            (Err(e), _) => {
                JobLogger::unsubmitted(index, self.vendor).log_error(&e.to_string());
                BatchItem::SubmitFailed {
                    index,
                    error: e.to_string(),
                }
            }
        }
    }

    fn log_summary<T, E>(&self, report: &BatchReport<T, E>) {
        info!(
            vendor = %self.vendor,
            total = report.len(),
            succeeded = report.successes().len(),
            failed = report.failures().len(),
            timed_out = report.timed_out(),
            submit_failed = report.submit_failures(),
            "Batch finished"
        );
    }
}
