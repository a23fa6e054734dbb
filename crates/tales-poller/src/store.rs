//! In-memory job store.
//!
//! Replaces module-level dictionaries of in-flight jobs with an explicit,
//! cloneable handle. Every clone shares the same map, so a poller can
//! publish progress while any other task looks a job up by id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use tales_models::{JobId, JobSnapshot, JobStatus};

/// Shared map of job snapshots keyed by vendor job id.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, JobSnapshot>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a snapshot.
    ///
    /// A terminal snapshot is never replaced by a non-terminal one for the
    /// same job, so a late writer cannot move a job backwards. Returns
    /// `false` when the write was ignored for that reason.
    pub async fn upsert(&self, snapshot: JobSnapshot) -> bool {
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(&snapshot.job_id) {
            if existing.is_terminal() && !snapshot.is_terminal() {
                debug!(
                    job_id = %snapshot.job_id,
                    existing = %existing.status,
                    incoming = %snapshot.status,
                    "Ignoring stale job snapshot"
                );
                return false;
            }
        }
        jobs.insert(snapshot.job_id.clone(), snapshot);
        true
    }

    pub async fn get(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Apply `f` to a stored snapshot.
    ///
    /// Returns `false` if the job is unknown, or if `f` would move a
    /// terminal job back to an active status; the stored snapshot is then
    /// left untouched.
    pub async fn update<F>(&self, job_id: &JobId, f: F) -> bool
    where
        F: FnOnce(&mut JobSnapshot),
    {
        let mut jobs = self.jobs.write().await;
        let Some(existing) = jobs.get_mut(job_id) else {
            return false;
        };

        let mut updated = existing.clone();
        f(&mut updated);

        if existing.is_terminal() && !updated.is_terminal() {
            debug!(
                job_id = %job_id,
                existing = %existing.status,
                incoming = %updated.status,
                "Ignoring update that reopens a finished job"
            );
            return false;
        }

        *existing = updated;
        true
    }

    pub async fn remove(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.jobs.write().await.remove(job_id)
    }

    /// Non-terminal jobs, oldest submission first.
    pub async fn active(&self) -> Vec<JobSnapshot> {
        let mut active: Vec<JobSnapshot> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|s| !s.is_terminal())
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        active
    }

    /// Number of jobs per status.
    pub async fn counts(&self) -> HashMap<JobStatus, usize> {
        let mut counts = HashMap::new();
        for snapshot in self.jobs.read().await.values() {
            *counts.entry(snapshot.status).or_insert(0) += 1;
        }
        counts
    }

    /// Drop every terminal job once its outcome has been consumed.
    pub async fn purge_terminal(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, s| !s.is_terminal());
        before - jobs.len()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tales_models::Job;

    fn snapshot(id: &str, status: JobStatus) -> JobSnapshot {
        let mut snapshot = Job::<String>::new(id).snapshot();
        snapshot.status = status;
        snapshot
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = JobStore::new();
        assert!(store.upsert(snapshot("job-1", JobStatus::Running)).await);

        let found = store.get(&JobId::from("job-1")).await.unwrap();
        assert_eq!(found.status, JobStatus::Running);
        assert!(store.get(&JobId::from("missing")).await.is_none());
    }

    #[tokio::test]
    async fn test_terminal_snapshot_is_not_overwritten() {
        let store = JobStore::new();
        store.upsert(snapshot("job-1", JobStatus::Completed)).await;

        assert!(!store.upsert(snapshot("job-1", JobStatus::Running)).await);
        assert_eq!(
            store.get(&JobId::from("job-1")).await.unwrap().status,
            JobStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_update_cannot_reopen_finished_job() {
        let store = JobStore::new();
        store.upsert(snapshot("job-1", JobStatus::Failed)).await;

        let reopened = store
            .update(&JobId::from("job-1"), |s| {
                s.status = JobStatus::Running;
                s.attempts = 9;
            })
            .await;

        assert!(!reopened);
        let stored = store.get(&JobId::from("job-1")).await.unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.attempts, 0);

        // Terminal-to-terminal edits still apply.
        assert!(
            store
                .update(&JobId::from("job-1"), |s| s.error_message = Some("nsfw".into()))
                .await
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = JobStore::new();
        let reader = store.clone();

        store.upsert(snapshot("job-1", JobStatus::Pending)).await;
        assert_eq!(reader.len().await, 1);

        assert!(
            reader
                .update(&JobId::from("job-1"), |s| s.attempts = 7)
                .await
        );
        assert_eq!(store.get(&JobId::from("job-1")).await.unwrap().attempts, 7);
        assert!(!reader.update(&JobId::from("job-2"), |_| {}).await);
    }

    #[tokio::test]
    async fn test_active_and_purge() {
        let store = JobStore::new();
        store.upsert(snapshot("a", JobStatus::Running)).await;
        store.upsert(snapshot("b", JobStatus::Failed)).await;
        store.upsert(snapshot("c", JobStatus::TimedOut)).await;
        store.upsert(snapshot("d", JobStatus::Pending)).await;

        let active: Vec<String> = store
            .active()
            .await
            .into_iter()
            .map(|s| s.job_id.to_string())
            .collect();
        assert_eq!(active.len(), 2);
        assert!(active.contains(&"a".to_string()));
        assert!(active.contains(&"d".to_string()));

        let counts = store.counts().await;
        assert_eq!(counts.get(&JobStatus::Failed), Some(&1));

        assert_eq!(store.purge_terminal().await, 2);
        assert_eq!(store.len().await, 2);
        assert!(store.remove(&JobId::from("a")).await.is_some());
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let store = JobStore::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(snapshot(&format!("job-{}", i), JobStatus::Running))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(store.len().await, 16);
    }
}
