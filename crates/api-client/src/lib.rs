use crate::error::ApiError;
use async_trait::async_trait;
use configuration::StatsSourceSettings;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

pub mod error;
pub mod responses;
// --- Public API ---
pub use responses::StatsResponse;

/// The abstract interface for the third-party performance feed.
/// The sync pipeline only sees this trait, so the live HTTP client can be swapped for a
/// scripted one in tests.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetches the current raw figures for the account known to the feed as `username`.
    async fn fetch_stats(&self, username: &str) -> Result<StatsResponse, ApiError>;
}

/// A concrete `StatsSource` that queries a JSON-over-HTTP feed.
#[derive(Clone)]
pub struct HttpStatsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatsClient {
    pub fn new(settings: &StatsSourceSettings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ApiError::InvalidData(format!("Invalid API key: {e}")))?;
            headers.insert("X-API-KEY", value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StatsSource for HttpStatsClient {
    async fn fetch_stats(&self, username: &str) -> Result<StatsResponse, ApiError> {
        if username.trim().is_empty() {
            return Err(ApiError::InvalidData("username must not be empty".to_string()));
        }

        tracing::debug!(username, "Fetching stats from feed.");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("username", username)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::ApiError(status.as_u16(), text));
        }
        serde_json::from_str::<StatsResponse>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}
