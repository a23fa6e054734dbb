//! Bounded fan-out for vendor jobs.
//!
//! Vendors rate-limit concurrent generations, so a permit is taken before a
//! job is submitted and held until its poller returns a terminal outcome.
//! At most `capacity` jobs are ever in flight per limiter.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use tales_models::{JobId, Outcome, Vendor};

use crate::check::StatusCheck;
use crate::error::SubmitError;
use crate::metrics;
use crate::poller::JobPoller;

/// Counting limiter shared by every task submitting to one vendor.
#[derive(Debug, Clone)]
pub struct JobLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    label: String,
}

impl JobLimiter {
    /// Create a limiter allowing `capacity` jobs in flight (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            label: "default".to_string(),
        }
    }

    /// Limiter sized to the vendor's usual rate limit.
    pub fn for_vendor(vendor: Vendor) -> Self {
        Self::new(vendor.default_max_in_flight()).with_label(vendor.as_str())
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Run `task` while holding a permit.
    pub async fn run<F, T>(&self, task: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let permit = self.semaphore.acquire().await.ok()?;
        metrics::set_in_flight(&self.label, self.in_flight());

        let result = task.await;

        drop(permit);
        metrics::set_in_flight(&self.label, self.in_flight());
        Some(result)
    }

    /// Submit a job and wait for its terminal outcome under one permit.
    ///
    /// The permit is acquired before `submit` runs and released only once
    /// the poller returns, so a slow vendor holds its slot for the whole
    /// generation. A failed submission releases the permit immediately.
    pub async fn submit_and_wait<S, Fut, SE, C>(
        &self,
        poller: &JobPoller,
        submit: S,
        check: &C,
    ) -> Result<Outcome<C::Payload, C::Reason>, SubmitError<SE>>
    where
        S: FnOnce() -> Fut,
        Fut: Future<Output = Result<JobId, SE>>,
        C: StatusCheck + ?Sized,
    {
        let result = self
            .run(async {
                let job_id = match submit().await {
                    Ok(job_id) => job_id,
                    Err(e) => return Err(SubmitError::Submit(e)),
                };
                debug!(
                    job_id = %job_id,
                    limiter = %self.label,
                    in_flight = self.in_flight(),
                    "Job submitted"
                );
                poller
                    .try_await_completion(&job_id, check)
                    .await
                    .map_err(SubmitError::Poll)
            })
            .await;

        result.unwrap_or(Err(SubmitError::LimiterClosed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::join_all;
    use tales_models::StatusSample;

    use crate::check::status_fn;
    use crate::config::PollConfig;

    fn poller() -> JobPoller {
        JobPoller::new(PollConfig::new(Duration::from_secs(1), Duration::from_secs(30)).unwrap())
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        assert_eq!(JobLimiter::new(0).capacity(), 1);
        assert_eq!(JobLimiter::for_vendor(Vendor::GoApi).capacity(), 5);
        assert_eq!(JobLimiter::new(3).in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_capacity() {
        let limiter = JobLimiter::new(2);
        let poller = poller();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        // Each job reports running twice, then completes.
        let check = {
            let active = Arc::clone(&active);
            let polls = Arc::new(std::sync::Mutex::new(std::collections::HashMap::new()));
            status_fn(move |job_id: JobId| {
                let n = {
                    let mut polls = polls.lock().unwrap();
                    let n = polls.entry(job_id.clone()).or_insert(0u32);
                    *n += 1;
                    *n
                };
                let active = Arc::clone(&active);
                async move {
                    if n >= 3 {
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, String>(StatusSample::<String>::Completed(job_id.to_string()))
                    } else {
                        Ok(StatusSample::Running)
                    }
                }
            })
        };

        let tasks = (0..6).map(|i| {
            let limiter = &limiter;
            let poller = &poller;
            let check = &check;
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                limiter
                    .submit_and_wait(
                        poller,
                        || async move {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            Ok::<_, String>(JobId::from(format!("job-{}", i)))
                        },
                        check,
                    )
                    .await
            }
        });

        let outcomes = join_all(tasks).await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, Ok(Outcome::Success(_)))));
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_releases_permit() {
        let limiter = JobLimiter::new(1);
        let check = status_fn(|_job_id: JobId| async move {
            Ok::<_, String>(StatusSample::<String>::Completed("ok".to_string()))
        });

        let failed = limiter
            .submit_and_wait(&poller(), || async { Err::<JobId, _>("400 bad request") }, &check)
            .await;
        assert!(matches!(failed, Err(SubmitError::Submit("400 bad request"))));
        assert_eq!(limiter.in_flight(), 0);

        let ok = limiter
            .submit_and_wait(
                &poller(),
                || async { Ok::<_, &str>(JobId::from("job-2")) },
                &check,
            )
            .await;
        assert!(matches!(ok, Ok(Outcome::Success(ref url)) if url == "ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_submitted_id_is_a_poll_error() {
        let limiter = JobLimiter::new(1);
        let check = status_fn(|_job_id: JobId| async move {
            Ok::<_, String>(StatusSample::<String>::Running)
        });

        let result = limiter
            .submit_and_wait(&poller(), || async { Ok::<_, String>(JobId::from("")) }, &check)
            .await;

        assert!(matches!(result, Err(SubmitError::Poll(_))));
    }
}
