//! Job status polling engine for the Vitrine generation studio.
//!
//! Tracks many concurrently outstanding image/video generation jobs by
//! repeatedly polling the backend's status endpoint: bounded retries,
//! a page-visibility gate, tolerance for eventual-consistency 404s, and
//! deduplication of redundant persistence writes.
//!
//! The pieces compose bottom-up: a [`StatusFetch`] implementation (the
//! HTTP [`StudioClient`], or anything scripted in tests) feeds a
//! [`JobMonitor`] strategy — typically a [`GenerationTracker`] wired to a
//! [`StatusSink`] — which a [`PollingController`] drives with one poll
//! task per job.

pub mod config;
pub mod poller;
pub mod studio;
pub mod tracker;

pub use config::VitrineConfig;
pub use poller::{JobMonitor, PollDecision, PollerSettings, PollingController, ResumeStyle};
pub use studio::{FetchResult, JobStatus, JobStatusPayload, StatusFetch, StudioClient, StudioError};
pub use tracker::{GenerationContext, GenerationTracker, StatusSink};
