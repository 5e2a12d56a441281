use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{LocationRecord, ResponseEnvelope};

/// Closed, hand-maintained table of regional synonyms. A catalog name that
/// contains the fragment on the left also registers the aliases on the right.
const CITY_SYNONYMS: &[(&str, &[&str])] = &[
    ("miền đông", &["tp.hcm", "tphcm", "hồ chí minh", "sài gòn", "saigon"]),
    ("mien dong", &["tp.hcm", "tphcm", "hồ chí minh", "sài gòn", "saigon"]),
    ("giáp bát", &["hà nội", "ha noi", "hanoi", "hn"]),
    ("giap bat", &["hà nội", "ha noi", "hanoi", "hn"]),
    ("điện biên", &["dien bien"]),
    ("dien bien", &["điện biên"]),
];

/// Static last-resort table used when the catalog is unreachable. Locations
/// absent from this table are simply unresolvable while the catalog is down.
const FALLBACK_LOCATIONS: &[(&str, i64)] = &[
    ("điện biên", 22),
    ("dien bien", 22),
    ("an giang", 8),
];

#[async_trait]
pub trait LocationCatalog: Send + Sync {
    async fn fetch_locations(&self) -> AppResult<Vec<LocationRecord>>;
}

pub struct HttpLocationCatalog {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpLocationCatalog {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.catalog_timeout))
            .build()?;
        Ok(Self {
            http_client,
            base_url: config.backend_base_url.clone(),
        })
    }
}

#[async_trait]
impl LocationCatalog for HttpLocationCatalog {
    async fn fetch_locations(&self) -> AppResult<Vec<LocationRecord>> {
        let url = format!("{}/api/locations", self.base_url);
        let response = self
            .http_client
            .get(&url)
            // The backend is fronted by an ngrok tunnel during development.
            .header("ngrok-skip-browser-warning", "true")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "location catalog returned {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        let envelope: ResponseEnvelope<Vec<LocationRecord>> = serde_json::from_str(&body)?;
        Ok(envelope.into_inner())
    }
}

#[derive(Debug, Default)]
struct LocationCache {
    entries: BTreeMap<String, i64>,
    built_at: Option<DateTime<Utc>>,
}

/// Resolves free-form location names to backend location ids through an
/// in-memory alias map rebuilt from the catalog when it goes stale.
///
/// Resolution never raises: the caller always gets an id or nothing, with
/// the fallback table standing in when the catalog is unreachable.
pub struct LocationService {
    catalog: Arc<dyn LocationCatalog>,
    cache: RwLock<LocationCache>,
    cache_ttl: u64,
    max_retries: u32,
    retry_delay: u64,
}

impl LocationService {
    pub fn new(catalog: Arc<dyn LocationCatalog>, config: &AppConfig) -> Self {
        Self {
            catalog,
            cache: RwLock::new(LocationCache::default()),
            cache_ttl: config.location_cache_ttl,
            max_retries: config.catalog_max_retries,
            retry_delay: config.catalog_retry_delay,
        }
    }

    /// Startup pre-load so the first webhook request doesn't pay for the
    /// catalog fetch. Failure is non-fatal.
    pub async fn warm(&self) {
        self.ensure_fresh().await;
    }

    pub async fn resolve(&self, name: &str) -> Option<i64> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.ensure_fresh().await;
        let cache = self.cache.read().await;
        let resolved = lookup(&cache.entries, &query);
        if resolved.is_none() {
            warn!(query = %query, "no location id found");
        }
        resolved
    }

    async fn ensure_fresh(&self) {
        {
            let cache = self.cache.read().await;
            if !cache.entries.is_empty() && !self.is_stale(&cache) {
                return;
            }
        }
        // Concurrent stale detections may each refresh; last writer wins.
        self.refresh().await;
    }

    fn is_stale(&self, cache: &LocationCache) -> bool {
        match cache.built_at {
            Some(built_at) => (Utc::now() - built_at).num_seconds() > self.cache_ttl as i64,
            None => true,
        }
    }

    async fn refresh(&self) {
        let entries = match self.fetch_with_retry().await {
            Ok(records) => {
                let entries = build_alias_map(&records);
                info!(
                    locations = records.len(),
                    aliases = entries.len(),
                    "location cache rebuilt from catalog"
                );
                entries
            }
            Err(error) => {
                warn!(error = %error, "catalog unreachable, installing fallback location table");
                fallback_map()
            }
        };
        // The map is fully built before publication; readers never observe a
        // partial cache. Stamping built_at on the fallback path too keeps
        // repeated catalog failures from hot-looping within the TTL window.
        let mut cache = self.cache.write().await;
        cache.entries = entries;
        cache.built_at = Some(Utc::now());
    }

    async fn fetch_with_retry(&self) -> AppResult<Vec<LocationRecord>> {
        let mut attempt = 0;
        loop {
            match self.catalog.fetch_locations().await {
                Ok(records) => return Ok(records),
                Err(error) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        return Err(error);
                    }
                    debug!(attempt, error = %error, "catalog fetch failed, retrying");
                    sleep(Duration::from_secs(self.retry_delay * u64::from(attempt))).await;
                }
            }
        }
    }

    #[cfg(test)]
    async fn backdate_cache(&self, seconds: i64) {
        let mut cache = self.cache.write().await;
        cache.built_at = cache
            .built_at
            .map(|built_at| built_at - chrono::Duration::seconds(seconds));
    }
}

/// Builds the alias map for one cache generation: for every record the
/// lowercased full name, the portion before a `-` separator when distinct,
/// and the synonym expansions from [`CITY_SYNONYMS`].
fn build_alias_map(records: &[LocationRecord]) -> BTreeMap<String, i64> {
    let mut entries = BTreeMap::new();
    for record in records {
        let (Some(id), Some(name)) = (record.location_id, record.location_name.as_deref()) else {
            continue;
        };
        let lower_name = name.trim().to_lowercase();
        if lower_name.is_empty() {
            continue;
        }
        entries.insert(lower_name.clone(), id);

        if let Some((base, _)) = lower_name.split_once('-') {
            let base = base.trim();
            if !base.is_empty() && base != lower_name {
                entries.insert(base.to_string(), id);
            }
        }

        for (fragment, aliases) in CITY_SYNONYMS {
            if lower_name.contains(fragment) {
                for alias in *aliases {
                    entries.insert((*alias).to_string(), id);
                }
            }
        }
    }
    entries
}

fn fallback_map() -> BTreeMap<String, i64> {
    FALLBACK_LOCATIONS
        .iter()
        .map(|(alias, id)| ((*alias).to_string(), *id))
        .collect()
}

/// Exact alias match first, then substring containment in either direction.
/// The `BTreeMap` makes the substring fallback deterministic: the first match
/// in lexicographic key order wins.
fn lookup(entries: &BTreeMap<String, i64>, query: &str) -> Option<i64> {
    if let Some(&id) = entries.get(query) {
        return Some(id);
    }
    entries
        .iter()
        .find(|(alias, _)| alias.contains(query) || query.contains(alias.as_str()))
        .map(|(_, &id)| id)
}
