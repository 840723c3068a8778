use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use super::error::StudioError;
use super::types::{FetchResult, JobStatusPayload};

const API_URL: &str = "https://api.vitrine.studio/v1";

/// One-shot status lookup against the generation backend.
///
/// The poll engine only ever needs this single operation, so the seam is a
/// one-method trait; tests substitute scripted fetchers for the HTTP client.
/// Futures must be `Send` because fetches run inside spawned poll tasks.
pub trait StatusFetch: Send + Sync {
    fn fetch_status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<FetchResult, StudioError>> + Send;
}

pub struct StudioClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl StudioClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url,
        }
    }

    async fn get_job_status(&self, job_id: &str) -> Result<FetchResult, StudioError> {
        let url = format!("{}/jobs/{job_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();

        // 404 is not an error here: the job record may simply not be
        // externally visible yet, or was already cleaned up by the backend.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(FetchResult::NotFound);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(StudioError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StudioError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let payload = response.json::<JobStatusPayload>().await?;
        Ok(FetchResult::Status(payload))
    }
}

impl StatusFetch for StudioClient {
    async fn fetch_status(&self, job_id: &str) -> Result<FetchResult, StudioError> {
        self.get_job_status(job_id).await
    }
}
