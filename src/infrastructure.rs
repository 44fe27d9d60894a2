//! Infrastructure layer for database access, feed retrieval, and external integrations
//!
//! This module provides the SQLite connection and repositories, the HTTP
//! feed client, configuration management, and logging setup.

pub mod backup_repository;
pub mod config;
pub mod database_connection;
pub mod feed_client;
pub mod http_client;
pub mod logging;
pub mod product_repository;
pub mod sync_run_repository;
pub mod taxonomy_repository;

// Re-export commonly used items
pub use backup_repository::BackupRepository;
pub use config::{AppConfig, ConfigManager};
pub use database_connection::DatabaseConnection;
pub use feed_client::HttpFeedClient;
pub use http_client::{HttpClient, HttpClientConfig};
pub use product_repository::ProductRepository;
pub use sync_run_repository::{SyncRun, SyncRunRepository};
pub use taxonomy_repository::TaxonomyRepository;
