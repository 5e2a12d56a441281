pub mod config;
pub mod datetime;
pub mod environment;
pub mod errors;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod services;
