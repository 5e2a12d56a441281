use anyhow::Result;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::location_service::{HttpLocationCatalog, LocationService};
use crate::services::trip_search::{BackendTripSearcher, TripSearcher};

#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<LocationService>,
    pub trip_searcher: Arc<dyn TripSearcher>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let catalog = Arc::new(HttpLocationCatalog::new(&config)?);
        let locations = Arc::new(LocationService::new(catalog, &config));
        let trip_searcher: Arc<dyn TripSearcher> = Arc::new(BackendTripSearcher::new(&config)?);

        Ok(Self {
            locations,
            trip_searcher,
            config,
        })
    }
}
