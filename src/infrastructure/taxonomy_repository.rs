//! Persistence for the category taxonomy cache
//!
//! The taxonomy table is a cache of the tree extracted from the latest feed
//! pull: one row per main category with its subcategories JSON-encoded.
//! Every sync replaces the whole table inside one transaction, so readers
//! never observe a half-updated tree.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::domain::taxonomy::Taxonomy;

/// Repository for the taxonomy table
#[derive(Clone)]
pub struct TaxonomyRepository {
    pool: Arc<SqlitePool>,
}

impl TaxonomyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Replace the cached taxonomy with the tree from the current pull.
    /// Main categories that disappeared from the feed disappear here too.
    pub async fn replace(&self, taxonomy: &Taxonomy) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM taxonomy").execute(&mut *tx).await?;

        for (main, subs) in &taxonomy.categories {
            let subcategories = serde_json::to_string(&subs.iter().collect::<Vec<_>>())
                .context("Failed to encode subcategories")?;
            sqlx::query(
                "INSERT INTO taxonomy (main_category, subcategories, updated_at) VALUES (?, ?, ?)",
            )
            .bind(main)
            .bind(subcategories)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load the cached taxonomy. Rows with undecodable subcategory JSON are
    /// treated as having none; the cache is derivable, not authoritative.
    pub async fn load(&self) -> Result<Taxonomy> {
        let rows = sqlx::query("SELECT main_category, subcategories FROM taxonomy ORDER BY main_category")
            .fetch_all(&*self.pool)
            .await?;

        let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in rows {
            let main: String = row.get("main_category");
            let raw: String = row.get("subcategories");
            let subs: BTreeSet<String> = serde_json::from_str(&raw).unwrap_or_default();
            categories.insert(main, subs);
        }

        Ok(Taxonomy { categories })
    }
}
