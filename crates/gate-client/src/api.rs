//! Check-in service client.

use std::time::Duration;

use async_trait::async_trait;
use domain::models::{OfflineSyncRequest, ReconcileReport, ScanRequest, ScanResponse};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Errors talking to the check-in service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response from check-in service: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// True when the service was not reached, so a scan should be buffered.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Http(_))
    }
}

/// Operations a gate device needs from the check-in service.
#[async_trait]
pub trait CheckInApi: Send + Sync {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResponse, ClientError>;

    async fn sync_offline(
        &self,
        request: &OfflineSyncRequest,
    ) -> Result<ReconcileReport, ClientError>;
}

/// Connection settings for [`HttpCheckInApi`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Staff bearer token.
    pub token: String,
    pub timeout_ms: u64,
}

/// [`CheckInApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCheckInApi {
    client: Client,
    config: ClientConfig,
}

/// Statuses that carry a scan outcome body rather than an API error.
fn is_scan_outcome_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK
            | StatusCode::CONFLICT
            | StatusCode::UNPROCESSABLE_ENTITY
            | StatusCode::NOT_FOUND
            | StatusCode::INTERNAL_SERVER_ERROR
    )
}

impl HttpCheckInApi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);
        debug!(url = %url, "Calling check-in service");

        self.client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.config.timeout_ms)
                } else {
                    ClientError::Http(e)
                }
            })
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

async fn rejected(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::Rejected { status, body }
}

#[async_trait]
impl CheckInApi for HttpCheckInApi {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResponse, ClientError> {
        let response = self.post("/api/v1/scans", request).await?;
        if is_scan_outcome_status(response.status()) {
            decode(response).await
        } else {
            Err(rejected(response).await)
        }
    }

    async fn sync_offline(
        &self,
        request: &OfflineSyncRequest,
    ) -> Result<ReconcileReport, ClientError> {
        let response = self.post("/api/v1/scans/offline-sync", request).await?;
        if response.status().is_success() {
            decode(response).await
        } else {
            Err(rejected(response).await)
        }
    }
}
