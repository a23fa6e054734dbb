//! Status-check capability injected into the poller.

use std::fmt::Display;
use std::future::Future;

use async_trait::async_trait;
use tales_models::{JobId, StatusSample};

/// Asks a vendor where a submitted job stands.
///
/// Implementations must be idempotent: the poller calls them repeatedly for
/// the same job. "Still running" is a normal [`StatusSample::Running`], never
/// an error. `Err` is reserved for transport failures and malformed
/// responses, which the poller swallows and retries on the next tick.
#[async_trait]
pub trait StatusCheck: Send + Sync {
    /// Vendor payload on completion (URL, JSON blob, ...).
    type Payload: Send;
    /// Vendor failure reason.
    type Reason: Display + Send;
    /// Transport-level error.
    type Error: Display + Send;

    async fn check_status(
        &self,
        job_id: &JobId,
    ) -> Result<StatusSample<Self::Payload, Self::Reason>, Self::Error>;
}

/// [`StatusCheck`] backed by an async closure.
pub struct FnStatusCheck<F> {
    f: F,
}

/// Wrap an async closure as a [`StatusCheck`].
///
/// ```ignore
/// let check = status_fn(move |job_id| {
///     let client = client.clone();
///     async move { client.status(&job_id).await }
/// });
/// ```
pub fn status_fn<F>(f: F) -> FnStatusCheck<F> {
    FnStatusCheck { f }
}

#[async_trait]
impl<F, Fut, T, R, E> StatusCheck for FnStatusCheck<F>
where
    F: Fn(JobId) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StatusSample<T, R>, E>> + Send + 'static,
    T: Send + 'static,
    R: Display + Send + 'static,
    E: Display + Send + 'static,
{
    type Payload = T;
    type Reason = R;
    type Error = E;

    async fn check_status(&self, job_id: &JobId) -> Result<StatusSample<T, R>, E> {
        (self.f)(job_id.clone()).await
    }
}
