//! HTTP Snapshot Client
//!
//! reqwest-based [`SnapshotFetcher`] for the dashboard endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Dataset, FetchError, FetchResult, SnapshotFetcher};
use crate::config::SourceConfig;
use crate::model::{RecentActivitySnapshot, StatsSnapshot};

/// Fetches snapshots over HTTP
pub struct HttpFetcher {
    client: Client,
    config: SourceConfig,
}

/// Error body returned by the backend with a 500
#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
}

impl HttpFetcher {
    /// Create a fetcher for the configured endpoints
    pub fn new(config: SourceConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(std::time::Duration::from_millis(ms));
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Full URL of a dataset's endpoint
    pub fn url(&self, dataset: Dataset) -> String {
        let path = match dataset {
            Dataset::Stats => &self.config.stats_path,
            Dataset::RecentActivity => &self.config.recent_activity_path,
        };
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, dataset: Dataset) -> FetchResult<T> {
        let url = self.url(dataset);
        tracing::debug!(%dataset, %url, "Fetching snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::transport(dataset, describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ServerError>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(FetchError::transport(
                dataset,
                format!("HTTP {}: {}", status.as_u16(), detail),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(dataset, describe_request_error(&e)))?;

        decode(dataset, &body)
    }
}

/// Decode a response body in two steps so the failure class is precise:
/// bytes that are not JSON are a parse error, JSON of the wrong shape is a
/// schema error.
pub fn decode<T: DeserializeOwned>(dataset: Dataset, body: &[u8]) -> FetchResult<T> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| FetchError::parse(dataset, e.to_string()))?;

    serde_json::from_value(value).map_err(|e| FetchError::schema(dataset, e.to_string()))
}

fn describe_request_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[async_trait]
impl SnapshotFetcher for HttpFetcher {
    async fn fetch_stats(&self) -> FetchResult<StatsSnapshot> {
        let stats: StatsSnapshot = self.get(Dataset::Stats).await?;
        stats
            .validate()
            .map_err(|message| FetchError::schema(Dataset::Stats, message))?;
        Ok(stats)
    }

    async fn fetch_recent_activity(&self) -> FetchResult<RecentActivitySnapshot> {
        self.get(Dataset::RecentActivity).await
    }
}
