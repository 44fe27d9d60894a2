//! Bookkeeping for sync passes
//!
//! One row per sync pass, completed or failed. Failed pulls leave their
//! mark in the history too; the latest completed row supplies the
//! `lastSync` timestamp on the status boundary operation.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Status of a run that reconciled the feed into the catalog.
pub const STATUS_COMPLETED: &str = "completed";
/// Status of a run aborted before any mutation (unreachable feed).
pub const STATUS_FAILED: &str = "failed";

/// Record of one sync pass.
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub id: String,
    pub feed_url: String,
    pub items_total: i64,
    pub created_count: i64,
    pub updated_count: i64,
    pub dropped_count: i64,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncRun {
    pub fn new(feed_url: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            feed_url: feed_url.to_string(),
            items_total: 0,
            created_count: 0,
            updated_count: 0,
            dropped_count: 0,
            status: STATUS_COMPLETED.to_string(),
            started_at,
            finished_at: started_at,
        }
    }
}

/// Repository for the sync_runs table
#[derive(Clone)]
pub struct SyncRunRepository {
    pool: Arc<SqlitePool>,
}

impl SyncRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn record(&self, run: &SyncRun) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_runs
            (id, feed_url, items_total, created_count, updated_count,
             dropped_count, status, started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.feed_url)
        .bind(run.items_total)
        .bind(run.created_count)
        .bind(run.updated_count)
        .bind(run.dropped_count)
        .bind(&run.status)
        .bind(run.started_at)
        .bind(run.finished_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// The most recent run of any status.
    pub async fn latest(&self) -> Result<Option<SyncRun>> {
        let row = sqlx::query(&select_latest_sql(""))
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| map_run(&r)))
    }

    /// The most recent run that actually reconciled the catalog. Failed
    /// pulls never advance the `lastSync` timestamp.
    pub async fn latest_completed(&self) -> Result<Option<SyncRun>> {
        let row = sqlx::query(&select_latest_sql("WHERE status = ?"))
            .bind(STATUS_COMPLETED)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| map_run(&r)))
    }
}

fn select_latest_sql(filter: &str) -> String {
    format!(
        r#"
        SELECT id, feed_url, items_total, created_count, updated_count,
               dropped_count, status, started_at, finished_at
        FROM sync_runs
        {filter}
        ORDER BY finished_at DESC, id DESC
        LIMIT 1
        "#
    )
}

fn map_run(row: &SqliteRow) -> SyncRun {
    SyncRun {
        id: row.get("id"),
        feed_url: row.get("feed_url"),
        items_total: row.get("items_total"),
        created_count: row.get("created_count"),
        updated_count: row.get("updated_count"),
        dropped_count: row.get("dropped_count"),
        status: row.get("status"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database_connection::DatabaseConnection;
    use tempfile::{tempdir, TempDir};

    async fn setup() -> Result<(TempDir, SyncRunRepository)> {
        let temp_dir = tempdir()?;
        let url = format!("sqlite:{}", temp_dir.path().join("test.db").display());
        let db = DatabaseConnection::new(&url).await?;
        db.migrate().await?;
        Ok((temp_dir, SyncRunRepository::new(db.pool().clone())))
    }

    #[tokio::test]
    async fn latest_returns_the_most_recent_run() -> Result<()> {
        let (_guard, repo) = setup().await?;
        assert!(repo.latest().await?.is_none());

        let started = Utc::now();
        let mut first = SyncRun::new("https://feed.example/export.json", started);
        first.created_count = 3;
        first.finished_at = started + chrono::Duration::seconds(1);
        repo.record(&first).await?;

        let mut second = SyncRun::new("https://feed.example/export.json", started);
        second.updated_count = 3;
        second.finished_at = started + chrono::Duration::seconds(60);
        repo.record(&second).await?;

        let latest = repo.latest().await?.unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.updated_count, 3);
        assert_eq!(latest.status, STATUS_COMPLETED);
        Ok(())
    }

    #[tokio::test]
    async fn failed_runs_are_kept_but_never_count_as_completed() -> Result<()> {
        let (_guard, repo) = setup().await?;

        let started = Utc::now();
        let mut completed = SyncRun::new("https://feed.example/export.json", started);
        completed.finished_at = started + chrono::Duration::seconds(1);
        repo.record(&completed).await?;

        let mut failed = SyncRun::new("https://feed.example/export.json", started);
        failed.status = STATUS_FAILED.to_string();
        failed.finished_at = started + chrono::Duration::seconds(60);
        repo.record(&failed).await?;

        // History shows the failed pull...
        let latest = repo.latest().await?.unwrap();
        assert_eq!(latest.status, STATUS_FAILED);

        // ...but the last completed run is still the earlier one.
        let latest_completed = repo.latest_completed().await?.unwrap();
        assert_eq!(latest_completed.id, completed.id);
        Ok(())
    }
}
