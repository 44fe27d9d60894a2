//! Application state wiring
//!
//! Builds the full service graph from configuration: database pool and
//! schema, repositories, the HTTP feed client, and the use-case services
//! the boundary exposes.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::use_cases::{BackupUseCases, OrphanUseCases, SyncUseCases};
use crate::domain::services::FeedProvider;
use crate::infrastructure::backup_repository::BackupRepository;
use crate::infrastructure::config::{AppConfig, ConfigManager};
use crate::infrastructure::database_connection::DatabaseConnection;
use crate::infrastructure::feed_client::HttpFeedClient;
use crate::infrastructure::product_repository::ProductRepository;
use crate::infrastructure::sync_run_repository::SyncRunRepository;
use crate::infrastructure::taxonomy_repository::TaxonomyRepository;

/// Wired application services.
pub struct AppState {
    pub config: AppConfig,
    pub sync: SyncUseCases,
    pub orphans: OrphanUseCases,
    pub backups: BackupUseCases,
}

impl AppState {
    /// Load (or create) the configuration file and wire everything up.
    pub async fn initialize() -> Result<Self> {
        let manager = ConfigManager::new()?;
        let config = manager.initialize_on_first_run().await?;
        Self::from_config(config).await
    }

    /// Wire the service graph from an explicit configuration. Used by the
    /// CLI after loading config and by tests with temporary databases.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let db = DatabaseConnection::with_max_connections(
            &config.database.url,
            config.database.max_connections,
        )
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
        db.migrate().await?;

        let pool = db.pool().clone();
        let products = ProductRepository::new(pool.clone());
        let backups = BackupRepository::new(pool.clone());
        let taxonomy = TaxonomyRepository::new(pool.clone());
        let sync_runs = SyncRunRepository::new(pool);

        let feed: Arc<dyn FeedProvider> =
            Arc::new(HttpFeedClient::new(&config.feed).context("Failed to build feed client")?);

        info!("Application state initialized");
        Ok(Self {
            sync: SyncUseCases::new(
                Arc::clone(&feed),
                products.clone(),
                taxonomy,
                sync_runs,
            ),
            orphans: OrphanUseCases::new(feed, products.clone(), backups.clone()),
            backups: BackupUseCases::new(products, backups),
            config,
        })
    }
}
