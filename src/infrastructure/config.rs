//! Configuration infrastructure
//!
//! Loads and persists the application configuration as JSON under the user
//! config directory. The feed URL is deliberately explicit configuration:
//! there is no compiled-in endpoint, and operations take the URL as a
//! parameter so tools and tests can point anywhere.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External feed endpoint and transport settings
    pub feed: FeedConfig,

    /// Catalog database location
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Feed endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed URL. Empty until an operator configures it; sync and orphan
    /// checks refuse to run without one.
    pub url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent string sent to the feed endpoint
    pub user_agent: String,

    /// Whether to follow redirects
    pub follow_redirects: bool,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite:/path/to/catalog.db`
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the log file
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Module-specific log level filters (e.g. "sqlx": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: format!(
                "catalog-sync/{} (internal catalog tool)",
                env!("CARGO_PKG_VERSION")
            ),
            follow_redirects: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Default database location under the user data directory.
pub fn default_database_url() -> String {
    dirs::data_local_dir()
        .map(|dir| {
            let path = dir.join("catalog-sync").join("database").join("catalog.db");
            format!("sqlite:{}", path.display())
        })
        .unwrap_or_else(|| "sqlite:data/catalog.db".to_string())
}

/// Manages the configuration file lifecycle
#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("catalog-sync");

        Ok(config_dir)
    }

    /// Create a new configuration manager with the standard file location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        let config_path = config_dir.join("config.json");

        Ok(Self { config_path })
    }

    /// Initialize the configuration system on first run
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        let config_dir = self
            .config_path
            .parent()
            .context("Failed to get config directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .await
                .context("Failed to create config directory")?;
            info!("✅ Created configuration directory: {:?}", config_dir);
        }

        let is_first_run = !self.config_path.exists();

        if is_first_run {
            info!("🎉 First run detected - initializing default configuration");

            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            self.create_data_directories().await?;

            info!("✅ Initial configuration written to {:?}", self.config_path);
            Ok(default_config)
        } else {
            self.load_config().await
        }
    }

    /// Create the data directory tree referenced by the default configuration
    async fn create_data_directories(&self) -> Result<()> {
        let Some(data_dir) = dirs::data_local_dir() else {
            return Ok(());
        };
        let database_dir = data_dir.join("catalog-sync").join("database");

        if !database_dir.exists() {
            fs::create_dir_all(&database_dir)
                .await
                .with_context(|| format!("Failed to create directory: {database_dir:?}"))?;
            info!("📁 Created directory: {:?}", database_dir);
        }

        Ok(())
    }

    /// Load configuration from file, creating the default if it doesn't exist.
    ///
    /// A file that no longer parses is backed up and replaced with defaults
    /// rather than blocking startup.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Configuration file not found, creating default: {:?}",
                self.config_path
            );
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => Ok(config),
            Err(parse_error) => {
                warn!("⚠️ Configuration file unreadable: {}", parse_error);
                warn!("⚠️ Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to back up corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        Ok(())
    }
}

/// Default configuration values
pub mod defaults {
    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default connection pool size
    pub const DB_MAX_CONNECTIONS: u32 = 10;

    /// Default log level
    pub const LOG_LEVEL: &str = "info";
}
