// Database connection and pool management
// This module handles SQLite database connections using sqlx

use std::path::Path;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_max_connections(database_url, 10).await
    }

    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        // Create database file and directory if they don't exist
        let db_path = if database_url.starts_with("sqlite://") {
            database_url.trim_start_matches("sqlite://")
        } else if database_url.starts_with("sqlite:") {
            database_url.trim_start_matches("sqlite:")
        } else {
            database_url
        };

        if db_path != ":memory:" {
            if let Some(parent) = Path::new(db_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            if !Path::new(db_path).exists() {
                std::fs::File::create(db_path)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_products_sql = r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                sku TEXT UNIQUE,
                name TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                price REAL,
                available BOOLEAN NOT NULL DEFAULT 1,
                brand TEXT,
                category TEXT,
                subcategory TEXT,
                product_url TEXT,
                synced_at DATETIME,
                claim TEXT,
                target_audience TEXT,
                social_copy TEXT,
                hashtags TEXT,
                tier TEXT,
                quick_info TEXT,
                faq TEXT,
                forecast_text TEXT,
                seasonal_text TEXT,
                sensory_text TEXT,
                pdf_url TEXT,
                video_url TEXT,
                top_slot INTEGER,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
        "#;

        let create_product_media_sql = r#"
            CREATE TABLE IF NOT EXISTS product_media (
                id TEXT PRIMARY KEY,
                product_id TEXT NOT NULL,
                blob_ref TEXT NOT NULL,
                filename TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL DEFAULT 0,
                tag TEXT,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products (id) ON DELETE CASCADE
            )
        "#;

        let create_marketing_backups_sql = r#"
            CREATE TABLE IF NOT EXISTS marketing_backups (
                id TEXT PRIMARY KEY,
                sku TEXT NOT NULL,
                original_name TEXT NOT NULL,
                claim TEXT,
                target_audience TEXT,
                social_copy TEXT,
                hashtags TEXT,
                tier TEXT,
                quick_info TEXT,
                faq TEXT,
                forecast_text TEXT,
                seasonal_text TEXT,
                sensory_text TEXT,
                pdf_url TEXT,
                video_url TEXT,
                top_slot INTEGER,
                backed_up_at DATETIME NOT NULL
            )
        "#;

        let create_media_backups_sql = r#"
            CREATE TABLE IF NOT EXISTS media_backups (
                id TEXT PRIMARY KEY,
                sku TEXT NOT NULL,
                blob_ref TEXT NOT NULL,
                filename TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL DEFAULT 0,
                tag TEXT,
                backed_up_at DATETIME NOT NULL
            )
        "#;

        let create_taxonomy_sql = r#"
            CREATE TABLE IF NOT EXISTS taxonomy (
                main_category TEXT PRIMARY KEY,
                subcategories TEXT NOT NULL,
                updated_at DATETIME NOT NULL
            )
        "#;

        let create_sync_runs_sql = r#"
            CREATE TABLE IF NOT EXISTS sync_runs (
                id TEXT PRIMARY KEY,
                feed_url TEXT NOT NULL,
                items_total INTEGER NOT NULL DEFAULT 0,
                created_count INTEGER NOT NULL DEFAULT 0,
                updated_count INTEGER NOT NULL DEFAULT 0,
                dropped_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'completed',
                started_at DATETIME NOT NULL,
                finished_at DATETIME NOT NULL
            )
        "#;

        let create_indexes_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_products_sku ON products (sku);
            CREATE INDEX IF NOT EXISTS idx_products_name ON products (name);
            CREATE INDEX IF NOT EXISTS idx_product_media_product_id ON product_media (product_id);
            CREATE INDEX IF NOT EXISTS idx_marketing_backups_sku ON marketing_backups (sku);
            CREATE INDEX IF NOT EXISTS idx_media_backups_sku ON media_backups (sku);
            CREATE INDEX IF NOT EXISTS idx_sync_runs_finished_at ON sync_runs (finished_at);
        "#;

        sqlx::query(create_products_sql).execute(&self.pool).await?;
        sqlx::query(create_product_media_sql).execute(&self.pool).await?;
        sqlx::query(create_marketing_backups_sql).execute(&self.pool).await?;
        sqlx::query(create_media_backups_sql).execute(&self.pool).await?;
        sqlx::query(create_taxonomy_sql).execute(&self.pool).await?;
        sqlx::query(create_sync_runs_sql).execute(&self.pool).await?;

        // One statement per call; the prepared path takes a single statement.
        for statement in create_indexes_sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        info!("Database schema ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn connection_creates_missing_database_file() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("catalog").join("test.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        assert!(!db.pool().is_closed());
        assert!(db_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn migration_creates_all_tables() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_migration.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;

        for table in [
            "products",
            "product_media",
            "marketing_backups",
            "media_backups",
            "taxonomy",
            "sync_runs",
        ] {
            let result =
                sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                    .bind(table)
                    .fetch_optional(db.pool())
                    .await?;
            assert!(result.is_some(), "missing table {table}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn migration_is_idempotent() -> Result<()> {
        let temp_dir = tempdir()?;
        let database_url = format!("sqlite:{}", temp_dir.path().join("twice.db").display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;
        db.migrate().await?;
        Ok(())
    }
}
