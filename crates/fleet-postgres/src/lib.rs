mod client;
mod config;
mod device_repository;
mod models;
mod schema;

pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use device_repository::PostgresDeviceRepository;
pub use models::DeviceRow;
pub use schema::ensure_schema;
