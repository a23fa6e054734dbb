//! Job poller.
//!
//! Waits on a submitted vendor job by calling an injected [`StatusCheck`]
//! at a flat interval until the vendor reports a terminal state or the wait
//! budget runs out. There is no backoff: every vendor integration polls at
//! a fixed cadence.
//!
//! The deadline is checked between polls only, so a wait can overrun
//! `max_wait` by up to one `poll_interval`.

use std::fmt::Display;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use tales_models::{Job, JobId, Outcome, StatusSample};

use crate::check::StatusCheck;
use crate::config::PollConfig;
use crate::error::{PollError, PollResult};
use crate::metrics;
use crate::store::JobStore;
use crate::tracker::FailureTracker;

/// Consecutive transient failures logged before the tracker goes quiet.
const MAX_LOGGED_TRANSIENT_ERRORS: u32 = 3;

/// Wait for `job_id` to finish, checking every `poll_interval` for at most
/// `max_wait`.
///
/// Returns `Err` only for invalid input: an empty job id or a zero
/// duration. Vendor failures and timeouts come back as [`Outcome`]s.
pub async fn await_completion<C>(
    job_id: &JobId,
    check: &C,
    poll_interval: Duration,
    max_wait: Duration,
) -> PollResult<Outcome<C::Payload, C::Reason>>
where
    C: StatusCheck + ?Sized,
{
    let poller = JobPoller::new(PollConfig::new(poll_interval, max_wait)?);
    poller.try_await_completion(job_id, check).await
}

/// Reusable poller holding timing, an optional job store and a label for
/// logs and metrics.
///
/// Holds no per-job state, so one poller can serve any number of
/// concurrent waits.
#[derive(Debug, Clone)]
pub struct JobPoller {
    config: PollConfig,
    store: Option<JobStore>,
    label: String,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            store: None,
            label: "default".to_string(),
        }
    }

    /// Publish a snapshot to `store` after every state change.
    pub fn with_store(mut self, store: JobStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Name used in log fields and metric labels (usually the vendor).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&JobStore> {
        self.store.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait for a job, tracking it in a fresh [`Job`] record.
    ///
    /// An empty job id can never complete; it is reported as
    /// [`Outcome::TimedOut`] without calling the vendor. Use
    /// [`JobPoller::try_await_completion`] to reject it instead.
    pub async fn await_completion<C>(
        &self,
        job_id: &JobId,
        check: &C,
    ) -> Outcome<C::Payload, C::Reason>
    where
        C: StatusCheck + ?Sized,
    {
        if job_id.is_empty() {
            warn!(poller = %self.label, "Refusing to poll a job with an empty id");
            return Outcome::TimedOut;
        }

        let mut job = Job::new(job_id.clone());
        self.run(&mut job, check).await;
        job.into_outcome().unwrap_or(Outcome::TimedOut)
    }

    /// Like [`JobPoller::await_completion`] but validates the job id and
    /// the poller's timing first.
    pub async fn try_await_completion<C>(
        &self,
        job_id: &JobId,
        check: &C,
    ) -> PollResult<Outcome<C::Payload, C::Reason>>
    where
        C: StatusCheck + ?Sized,
    {
        if job_id.is_empty() {
            return Err(PollError::EmptyJobId);
        }
        self.config.validate()?;
        Ok(self.await_completion(job_id, check).await)
    }

    /// Poll on behalf of an existing [`Job`] record, updating it in place.
    ///
    /// A job that is already terminal is returned as-is without polling.
    pub async fn drive<C>(
        &self,
        job: &mut Job<C::Payload, C::Reason>,
        check: &C,
    ) -> Outcome<C::Payload, C::Reason>
    where
        C: StatusCheck + ?Sized,
        C::Payload: Clone,
        C::Reason: Clone,
    {
        if !job.is_terminal() {
            self.run(job, check).await;
        }
        job.outcome().unwrap_or(Outcome::TimedOut)
    }

    /// The poll loop. Always leaves `job` in a terminal state.
    async fn run<C>(&self, job: &mut Job<C::Payload, C::Reason>, check: &C)
    where
        C: StatusCheck + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + self.config.max_wait();
        let mut tracker = FailureTracker::new(MAX_LOGGED_TRANSIENT_ERRORS);

        if let Err(e) = job.mark_running() {
            warn!(job_id = %job.job_id, poller = %self.label, "Cannot poll job: {}", e);
            return;
        }
        self.publish(job).await;

        debug!(
            job_id = %job.job_id,
            poller = %self.label,
            interval_ms = self.config.poll_interval().as_millis() as u64,
            max_wait_secs = self.config.max_wait().as_secs_f64(),
            "Polling job"
        );

        loop {
            if Instant::now() >= deadline {
                if let Err(e) = job.time_out() {
                    warn!(job_id = %job.job_id, "Failed to record timeout: {}", e);
                }
                warn!(
                    job_id = %job.job_id,
                    poller = %self.label,
                    attempts = job.attempts(),
                    transient_errors = job.transient_errors(),
                    "Timed out waiting for job"
                );
                self.finish(job, "timed_out", started).await;
                return;
            }

            job.record_attempt();
            metrics::record_check(&self.label);

            let span = info_span!(
                "status_check",
                job_id = %job.job_id,
                poller = %self.label,
                attempt = job.attempts()
            );
            let sample = check.check_status(&job.job_id).instrument(span).await;

            match sample {
                Ok(StatusSample::Running) => {
                    tracker.record_success();
                    debug!(job_id = %job.job_id, attempt = job.attempts(), "Job still running");
                }
                Ok(StatusSample::Completed(payload)) => {
                    if let Err(e) = job.complete(payload) {
                        warn!(job_id = %job.job_id, "Failed to record completion: {}", e);
                    }
                    info!(
                        job_id = %job.job_id,
                        poller = %self.label,
                        attempts = job.attempts(),
                        "Job completed"
                    );
                    self.finish(job, "success", started).await;
                    return;
                }
                Ok(StatusSample::Failed(reason)) => {
                    warn!(
                        job_id = %job.job_id,
                        poller = %self.label,
                        attempts = job.attempts(),
                        "Vendor reported job failure: {}",
                        reason
                    );
                    if let Err(e) = job.fail(reason) {
                        warn!(job_id = %job.job_id, "Failed to record failure: {}", e);
                    }
                    self.finish(job, "failure", started).await;
                    return;
                }
                Err(e) => {
                    job.record_transient_error();
                    metrics::record_transient_error(&self.label);
                    if tracker.record_failure() {
                        warn!(
                            job_id = %job.job_id,
                            poller = %self.label,
                            attempt = job.attempts(),
                            "Status check failed, will retry: {}",
                            e
                        );
                    }
                }
            }

            self.publish(job).await;
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    async fn finish<T, E: Display>(&self, job: &Job<T, E>, outcome: &str, started: Instant) {
        metrics::record_outcome(&self.label, outcome, started.elapsed().as_secs_f64());
        self.publish(job).await;
    }

    async fn publish<T, E: Display>(&self, job: &Job<T, E>) {
        if let Some(store) = &self.store {
            store.upsert(job.snapshot()).await;
        }
    }
}
