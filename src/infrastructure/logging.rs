//! Logging system configuration and initialization
//!
//! Builds the tracing subscriber from the logging section of the app
//! config: an EnvFilter with per-module overrides, a console layer, and an
//! optional non-blocking file layer (plain or JSON). `RUST_LOG` overrides
//! the configured filter when set.

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    let config = LoggingConfig::default();
    init_logging_with_config(&config)
}

/// Initialize logging with custom configuration.
///
/// The configured level and module filters can be overridden at launch with
/// `RUST_LOG`, e.g. `RUST_LOG="debug,sqlx::query=debug"`.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        for (module, level) in &config.module_filters {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    });

    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (true, true) => {
            let log_dir = get_log_directory();
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

            let file_appender = rolling::never(&log_dir, "catalog-sync.log");
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().unwrap().push(file_guard);

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_ansi(false);
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_target(false);
                registry.with(file_layer).with(console_layer).init();
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_target(false)
                    .with_ansi(false);
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_target(false);
                registry.with(file_layer).with(console_layer).init();
            }
        }
        (true, false) => {
            let log_dir = get_log_directory();
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

            let file_appender = rolling::never(&log_dir, "catalog-sync.log");
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().unwrap().push(file_guard);

            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);
            registry.with(file_layer).init();
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_target(false);
            registry.with(console_layer).init();
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
    }

    #[test]
    fn test_log_directory_is_deterministic() {
        let log_dir = get_log_directory();
        assert!(log_dir.to_string_lossy().ends_with("logs"));
    }
}
