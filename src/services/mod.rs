pub mod location_service;
pub mod trip_search;
