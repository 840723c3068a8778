pub mod client;
pub mod error;
pub mod types;

pub use client::{StatusFetch, StudioClient};
pub use error::StudioError;
pub use types::{FetchResult, JobStatus, JobStatusPayload};
