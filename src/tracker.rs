//! Write-through status tracking with coarse-status deduplication.
//!
//! Every poll tick produces a status payload, but most ticks only move the
//! fine-grained fields (progress). Persisting the job document on every
//! tick would hammer the store, so [`GenerationTracker`] remembers the
//! last coarse status seen per job and only writes through when it
//! changes; progress still reaches the UI through a separate, cheaper
//! path on the [`StatusSink`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::poller::{JobMonitor, PollDecision};
use crate::studio::{FetchResult, JobStatus, JobStatusPayload, StatusFetch};

/// Where a generation job's progress is recorded in the studio: the
/// collection it belongs to and the message/document representing it.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub collection_id: String,
    pub message_id: String,
}

/// Consumer-side persistence and UI surface for job status.
///
/// `persist_status` is the expensive write-through (a document update);
/// `publish_progress` is the cheap UI-facing path that may fire on every
/// tick. Persist failures are logged by the tracker and never interrupt
/// polling.
pub trait StatusSink: Send + Sync {
    fn persist_status(
        &self,
        job_id: &str,
        ctx: &GenerationContext,
        payload: &JobStatusPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Cheap UI-facing progress update; safe to call on every tick.
    fn publish_progress(&self, job_id: &str, progress: f32);

    /// Raise or clear the "generation in progress" flag for the context.
    fn set_generating(&self, ctx: &GenerationContext, active: bool);

    /// Whether local state already shows completion evidence for the job
    /// (e.g. non-empty image ids recorded on the message).
    fn has_recorded_outputs(&self, job_id: &str, ctx: &GenerationContext) -> bool;

    /// The job exhausted its retry budget; mark it failed in local state.
    fn mark_timed_out(
        &self,
        job_id: &str,
        ctx: &GenerationContext,
    ) -> impl Future<Output = ()> + Send;
}

/// A [`JobMonitor`] that reconciles polled status into a [`StatusSink`],
/// deduplicating redundant persistence writes.
///
/// The last-seen map holds an entry for exactly the jobs that were begun
/// and have not yet resolved; `None` means begun but no status observed
/// yet, so the first payload always writes through.
pub struct GenerationTracker<F: StatusFetch, S: StatusSink> {
    fetcher: F,
    sink: S,
    interval: Duration,
    last_status: Mutex<HashMap<String, Option<JobStatus>>>,
}

impl<F: StatusFetch, S: StatusSink> GenerationTracker<F, S> {
    pub fn new(fetcher: F, sink: S, interval: Duration) -> Self {
        Self {
            fetcher,
            sink,
            interval,
            last_status: Mutex::new(HashMap::new()),
        }
    }

    /// Start tracking a freshly submitted job: raise the generating flag
    /// and seed the dedup map so the first status always persists.
    pub fn begin(&self, job_id: impl Into<String>, ctx: &GenerationContext) {
        let job_id = job_id.into();
        self.seen().insert(job_id.clone(), None);
        self.sink.set_generating(ctx, true);
        tracing::debug!(
            job_id = %job_id,
            collection_id = %ctx.collection_id,
            "tracking generation",
        );
    }

    /// Whether the job was begun and has not yet resolved.
    pub fn is_tracking(&self, job_id: &str) -> bool {
        self.seen().contains_key(job_id)
    }

    fn seen(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<JobStatus>>> {
        self.last_status.lock().expect("last-status mutex poisoned")
    }

    /// Forget the job and clear the generating flag.
    fn resolve(&self, job_id: &str, ctx: &GenerationContext) {
        self.seen().remove(job_id);
        self.sink.set_generating(ctx, false);
    }
}

impl<F, S> JobMonitor for GenerationTracker<F, S>
where
    F: StatusFetch + 'static,
    S: StatusSink + 'static,
{
    type Context = GenerationContext;

    async fn fetch_status(&self, job_id: &str) -> anyhow::Result<FetchResult> {
        Ok(self.fetcher.fetch_status(job_id).await?)
    }

    async fn on_status(
        &self,
        job_id: &str,
        payload: &JobStatusPayload,
        ctx: &GenerationContext,
    ) -> PollDecision {
        let coarse = payload.status;
        let changed = {
            let mut seen = self.seen();
            match seen.get(job_id) {
                Some(Some(previous)) if *previous == coarse => false,
                _ => {
                    seen.insert(job_id.to_string(), Some(coarse));
                    true
                }
            }
        };

        if changed {
            tracing::debug!(job_id = %job_id, status = %coarse, "status changed, writing through");
            if let Err(error) = self.sink.persist_status(job_id, ctx, payload).await {
                tracing::error!(job_id = %job_id, error = %error, "failed to persist job status");
            }
        }
        if let Some(progress) = payload.progress {
            self.sink.publish_progress(job_id, progress);
        }

        match coarse {
            JobStatus::Completed => {
                self.resolve(job_id, ctx);
                PollDecision::Complete
            }
            JobStatus::Failed => {
                self.resolve(job_id, ctx);
                PollDecision::Fail
            }
            JobStatus::Pending | JobStatus::Processing => PollDecision::Continue,
        }
    }

    async fn on_not_found(&self, job_id: &str, ctx: &GenerationContext) -> PollDecision {
        if self.sink.has_recorded_outputs(job_id, ctx) {
            // The backend's TTL cleanup of the job record raced our final
            // poll; local state already shows the finished generation.
            tracing::debug!(job_id = %job_id, "job record gone but outputs recorded, resolving");
            self.resolve(job_id, ctx);
            PollDecision::Complete
        } else {
            tracing::debug!(job_id = %job_id, "job not externally visible yet, retrying");
            PollDecision::Continue
        }
    }

    async fn on_timeout(&self, job_id: &str, ctx: &GenerationContext) {
        tracing::warn!(job_id = %job_id, "generation timed out without a terminal status");
        self.sink.mark_timed_out(job_id, ctx).await;
        self.resolve(job_id, ctx);
    }

    fn on_fetch_error(&self, job_id: &str, error: &anyhow::Error) {
        tracing::warn!(job_id = %job_id, error = %error, "status fetch failed, will retry");
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }
}
