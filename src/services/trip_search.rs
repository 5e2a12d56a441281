use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ResponseEnvelope, TripPayload, TripSearchRequest};

#[async_trait]
pub trait TripSearcher: Send + Sync {
    async fn search(&self, request: &TripSearchRequest) -> AppResult<TripPayload>;
}

/// Reqwest client for the backend's trip-search endpoint. The call has a
/// bounded timeout and no retry; a failed search is translated into user
/// text at the orchestrator boundary instead of being retried.
pub struct BackendTripSearcher {
    http_client: reqwest::Client,
    base_url: String,
}

impl BackendTripSearcher {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.search_timeout))
            .build()?;
        Ok(Self {
            http_client,
            base_url: config.backend_base_url.clone(),
        })
    }
}

#[async_trait]
impl TripSearcher for BackendTripSearcher {
    async fn search(&self, request: &TripSearchRequest) -> AppResult<TripPayload> {
        let url = format!("{}/api/trips/search", self.base_url);
        debug!(
            start = request.start_location,
            end = request.end_location,
            departure = request.departure_date.as_deref().unwrap_or("-"),
            "searching trips"
        );
        let response = self.http_client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "trip search returned {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        let envelope: ResponseEnvelope<TripPayload> = serde_json::from_str(&body)?;
        Ok(envelope.into_inner())
    }
}
