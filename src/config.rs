use anyhow::{Context, Result};
use std::env;

/// Base URL of the trip-search backend; overridable for local development.
const DEFAULT_BACKEND_BASE_URL: &str = "https://randa-unhappi-castiel.ngrok-free.dev";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_base_url: String,
    pub port: u16,
    /// Seconds a built location cache is considered fresh.
    pub location_cache_ttl: u64,
    pub catalog_timeout: u64,
    pub catalog_max_retries: u32,
    pub catalog_retry_delay: u64,
    pub search_timeout: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_BASE_URL.to_string()),
            port: env::var("WEBHOOK_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Failed to parse WEBHOOK_PORT")?,
            location_cache_ttl: env::var("LOCATION_CACHE_TTL")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Failed to parse LOCATION_CACHE_TTL")?,
            catalog_timeout: env::var("CATALOG_TIMEOUT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("Failed to parse CATALOG_TIMEOUT")?,
            catalog_max_retries: env::var("CATALOG_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("Failed to parse CATALOG_MAX_RETRIES")?,
            catalog_retry_delay: env::var("CATALOG_RETRY_DELAY")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Failed to parse CATALOG_RETRY_DELAY")?,
            search_timeout: env::var("SEARCH_TIMEOUT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("Failed to parse SEARCH_TIMEOUT")?,
        })
    }
}
