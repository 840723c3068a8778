use std::future::Future;
use std::time::Duration;

use crate::studio::{FetchResult, JobStatusPayload};

/// What the controller should do with a job after a callback ran.
///
/// `Complete` and `Fail` both remove the job from tracking; the split
/// exists so consumers can distinguish a finished generation from a dead
/// one without a separate side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Keep polling (consumes one unit of the retry budget).
    Continue,
    /// The job reached a successful terminal state; stop polling.
    Complete,
    /// The job is terminally failed; stop polling.
    Fail,
}

/// Strategy bundle driving a [`PollingController`](crate::poller::PollingController).
///
/// One monitor instance serves every job the controller tracks; per-job
/// data travels in the caller-defined `Context`, which the engine never
/// inspects. Callbacks for a given job are invoked strictly sequentially.
///
/// Async methods are declared as `impl Future + Send` rather than plain
/// `async fn` so the futures of a generic monitor can be awaited inside
/// spawned poll tasks; implementations can still use `async fn`.
pub trait JobMonitor: Send + Sync + 'static {
    /// Caller-defined per-job context, handed back on every callback.
    type Context: Send + Sync + 'static;

    /// Query the backend once for the current status of `job_id`.
    ///
    /// Errors are contained by the engine: they are reported through
    /// [`on_fetch_error`](JobMonitor::on_fetch_error) and retried within
    /// the shared budget, never propagated to the caller.
    fn fetch_status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = anyhow::Result<FetchResult>> + Send;

    /// A status payload arrived. Decide whether polling continues.
    fn on_status(
        &self,
        job_id: &str,
        payload: &JobStatusPayload,
        ctx: &Self::Context,
    ) -> impl Future<Output = PollDecision> + Send;

    /// The backend does not (or no longer does) know the job.
    ///
    /// Returning `Continue` tolerates the eventual-consistency window
    /// before the job record becomes externally visible.
    fn on_not_found(
        &self,
        job_id: &str,
        ctx: &Self::Context,
    ) -> impl Future<Output = PollDecision> + Send;

    /// The retry budget was exhausted without a terminal status.
    /// Invoked exactly once; the job is removed afterwards.
    fn on_timeout(&self, job_id: &str, ctx: &Self::Context) -> impl Future<Output = ()> + Send;

    /// A fetch attempt failed. Informational only — the engine keeps
    /// retrying within the budget regardless.
    fn on_fetch_error(&self, job_id: &str, error: &anyhow::Error);

    /// Delay before the next attempt. Called before every reschedule, so
    /// implementations may adapt the interval over time.
    fn poll_interval(&self) -> Duration;
}
