pub mod api;
pub mod auth;
pub mod config;
pub mod engine_factory;
pub mod error;
pub mod images_factory;
pub mod records_factory;
pub mod telemetry;
