//! Multi-job status polling controller.
//!
//! [`PollingController`] multiplexes N independent "poll until terminal or
//! timed out" loops behind one handle. Each tracked job gets its own
//! spawned task and cancellation token, so there is never more than one
//! in-flight fetch or one pending timer per job, and callbacks for a given
//! job are strictly sequential. A shared visibility gate pauses every job
//! at once while the consuming page is backgrounded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::monitor::{JobMonitor, PollDecision};
use crate::studio::FetchResult;

/// What a job does with its first attempt after the page becomes visible
/// again (or after being started while hidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeStyle {
    /// Fetch promptly on resume, so the view is not stale after the user
    /// returns to the tab.
    Immediate,
    /// Wait one full poll interval after resuming before fetching.
    FullInterval,
}

/// Tunable parameters shared by every job of one controller instance.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// Maximum number of poll attempts (status, not-found, or error alike)
    /// before a job is declared timed out.
    pub max_retries: u32,
    /// First-attempt timing after regaining visibility.
    pub resume: ResumeStyle,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            max_retries: 60,
            resume: ResumeStyle::Immediate,
        }
    }
}

/// Bookkeeping for a single tracked job.
struct TrackedJob {
    /// Distinguishes this registration from an earlier stop/start cycle of
    /// the same job id.
    generation: u64,
    cancel: CancellationToken,
}

struct JobTable {
    entries: HashMap<String, TrackedJob>,
    next_generation: u64,
}

struct Inner<M: JobMonitor> {
    monitor: M,
    settings: PollerSettings,
    table: Mutex<JobTable>,
    visibility: watch::Sender<bool>,
}

impl<M: JobMonitor> Inner<M> {
    fn lock_table(&self) -> MutexGuard<'_, JobTable> {
        // The lock is never held across an await point.
        self.table.lock().expect("job table mutex poisoned")
    }

    /// Remove the entry for `job_id`, but only if it still belongs to the
    /// registration that `generation` was issued for.
    fn remove_job(&self, job_id: &str, generation: u64) {
        let mut table = self.lock_table();
        if table
            .entries
            .get(job_id)
            .is_some_and(|job| job.generation == generation)
        {
            table.entries.remove(job_id);
        }
    }
}

/// Tracks many concurrently outstanding generation jobs via repeated
/// status polling.
///
/// The handle is cheap to clone; all clones share the same job table,
/// visibility gate, and monitor. Independent controller instances share
/// nothing, so several can coexist (one per UI surface).
pub struct PollingController<M: JobMonitor> {
    inner: Arc<Inner<M>>,
}

impl<M: JobMonitor> Clone for PollingController<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: JobMonitor> PollingController<M> {
    /// Create a controller that dispatches to `monitor`. The gate starts
    /// visible.
    pub fn new(monitor: M, settings: PollerSettings) -> Self {
        let (visibility, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                monitor,
                settings,
                table: Mutex::new(JobTable {
                    entries: HashMap::new(),
                    next_generation: 0,
                }),
                visibility,
            }),
        }
    }

    /// Register `job_id` and begin polling it. Must be called from within
    /// a Tokio runtime.
    ///
    /// If the job is already tracked this is a strict no-op: neither the
    /// retry budget nor the context is reset. Restarting is spelled
    /// [`stop`](PollingController::stop) followed by `start`.
    pub fn start(&self, job_id: impl Into<String>, context: M::Context) {
        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        let generation;
        {
            let mut table = self.inner.lock_table();
            if table.entries.contains_key(&job_id) {
                tracing::debug!(job_id = %job_id, "job already tracked, start ignored");
                return;
            }
            generation = table.next_generation;
            table.next_generation += 1;
            table.entries.insert(
                job_id.clone(),
                TrackedJob {
                    generation,
                    cancel: cancel.clone(),
                },
            );
        }
        tracing::debug!(job_id = %job_id, "tracking job");
        tokio::spawn(poll_job(
            Arc::clone(&self.inner),
            job_id,
            context,
            cancel,
            generation,
        ));
    }

    /// Stop polling `job_id`, cancelling its pending timer synchronously.
    ///
    /// Idempotent; returns whether the job was tracked. A fetch already in
    /// flight is not aborted at the network layer — its resolution becomes
    /// a no-op because dispatch re-checks the token before any callback.
    pub fn stop(&self, job_id: &str) -> bool {
        let removed = self.inner.lock_table().entries.remove(job_id);
        match removed {
            Some(job) => {
                job.cancel.cancel();
                tracing::debug!(job_id = %job_id, "stopped tracking job");
                true
            }
            None => false,
        }
    }

    /// Stop every tracked job. The controller remains usable afterwards.
    pub fn stop_all(&self) {
        let entries = {
            let mut table = self.inner.lock_table();
            std::mem::take(&mut table.entries)
        };
        let count = entries.len();
        for job in entries.into_values() {
            job.cancel.cancel();
        }
        if count > 0 {
            tracing::debug!(count, "stopped all tracked jobs");
        }
    }

    /// Flip the shared visibility gate for every tracked job at once.
    ///
    /// While hidden, no fetch executes and no retry budget is consumed.
    /// On becoming visible again each paused job resumes according to
    /// [`ResumeStyle`].
    pub fn set_visibility(&self, visible: bool) {
        let previous = self.inner.visibility.send_replace(visible);
        if previous != visible {
            tracing::debug!(visible, "visibility changed");
        }
    }

    pub fn is_visible(&self) -> bool {
        *self.inner.visibility.borrow()
    }

    /// The monitor this controller dispatches to.
    pub fn monitor(&self) -> &M {
        &self.inner.monitor
    }

    pub fn is_tracked(&self, job_id: &str) -> bool {
        self.inner.lock_table().entries.contains_key(job_id)
    }

    /// Ids of all currently tracked jobs, in no particular order.
    pub fn active_jobs(&self) -> Vec<String> {
        self.inner.lock_table().entries.keys().cloned().collect()
    }
}

/// Block until the gate reads visible. Returns `Some(was_hidden)`, or
/// `None` if the job was cancelled while waiting.
async fn wait_until_visible(
    visibility: &mut watch::Receiver<bool>,
    cancel: &CancellationToken,
) -> Option<bool> {
    let mut was_hidden = false;
    while !*visibility.borrow_and_update() {
        was_hidden = true;
        tokio::select! {
            _ = cancel.cancelled() => return None,
            changed = visibility.changed() => changed.ok()?,
        }
    }
    Some(was_hidden)
}

/// Cancellable sleep. Returns `false` if the job was cancelled first.
async fn idle(cancel: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}

/// The per-job poll loop: gate on visibility, fetch, dispatch, reschedule.
///
/// Runs until the job reaches a terminal decision, exhausts its retry
/// budget, or is cancelled by `stop`/`stop_all`.
async fn poll_job<M: JobMonitor>(
    inner: Arc<Inner<M>>,
    job_id: String,
    context: M::Context,
    cancel: CancellationToken,
    generation: u64,
) {
    let mut visibility = inner.visibility.subscribe();
    let mut attempts: u32 = 0;

    loop {
        let was_hidden = match wait_until_visible(&mut visibility, &cancel).await {
            Some(was_hidden) => was_hidden,
            None => return,
        };
        if was_hidden && inner.settings.resume == ResumeStyle::FullInterval {
            if !idle(&cancel, inner.monitor.poll_interval()).await {
                return;
            }
            // The gate may have closed again during the pause.
            continue;
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = inner.monitor.fetch_status(&job_id) => result,
        };
        // The job may have been stopped while the fetch was in flight; a
        // removed job must not observe any further callback.
        if cancel.is_cancelled() {
            return;
        }

        attempts += 1;
        let decision = match result {
            Ok(FetchResult::Status(payload)) => {
                inner.monitor.on_status(&job_id, &payload, &context).await
            }
            Ok(FetchResult::NotFound) => inner.monitor.on_not_found(&job_id, &context).await,
            Err(error) => {
                tracing::debug!(job_id = %job_id, attempts, error = %error, "status fetch failed");
                inner.monitor.on_fetch_error(&job_id, &error);
                PollDecision::Continue
            }
        };

        match decision {
            PollDecision::Continue => {
                if attempts >= inner.settings.max_retries {
                    if cancel.is_cancelled() {
                        return;
                    }
                    tracing::warn!(job_id = %job_id, attempts, "retry budget exhausted, giving up");
                    inner.monitor.on_timeout(&job_id, &context).await;
                    inner.remove_job(&job_id, generation);
                    return;
                }
            }
            PollDecision::Complete | PollDecision::Fail => {
                tracing::debug!(job_id = %job_id, attempts, ?decision, "job resolved");
                inner.remove_job(&job_id, generation);
                return;
            }
        }

        if !idle(&cancel, inner.monitor.poll_interval()).await {
            return;
        }
    }
}
