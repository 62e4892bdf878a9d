pub mod config;
pub mod migrations;
pub mod store;

pub use config::PostgresRecordConfig;
pub use store::PostgresRecordStore;
