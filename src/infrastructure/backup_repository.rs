//! Repository for marketing and media backups
//!
//! Backups are append-only history tables keyed by sku. `backup_and_purge`
//! is the only path that deletes a live product, and it runs snapshot and
//! delete inside one transaction so the snapshot is committed strictly
//! before (or together with) the delete, never after.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::domain::backup::{BackupStats, MarketingBackup, MediaBackup, PurgeOutcome};
use crate::domain::product::{CatalogProduct, MarketingFields, ProductMedia};

const SELECT_BACKUP_SQL: &str = r#"
    SELECT id, sku, original_name,
           claim, target_audience, social_copy, hashtags, tier, quick_info,
           faq, forecast_text, seasonal_text, sensory_text, pdf_url, video_url,
           top_slot, backed_up_at
    FROM marketing_backups
"#;

/// Repository for the marketing_backups and media_backups tables
#[derive(Clone)]
pub struct BackupRepository {
    pool: Arc<SqlitePool>,
}

impl BackupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Snapshot a product's marketing fields and gallery references, then
    /// delete the live product and its media rows, all in one transaction.
    ///
    /// A marketing backup is written only when the product carries curated
    /// content; gallery references are always snapshotted. The underlying
    /// blobs are never touched, so media backups keep pointing at valid
    /// storage keys.
    pub async fn backup_and_purge(
        &self,
        product: &CatalogProduct,
        media: &[ProductMedia],
    ) -> Result<PurgeOutcome> {
        let sku = product
            .feed
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("cannot purge product without sku: {}", product.id))?;

        let now = Utc::now();
        let mut outcome = PurgeOutcome::default();
        let mut tx = self.pool.begin().await?;

        if !product.marketing.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO marketing_backups
                (id, sku, original_name, claim, target_audience, social_copy,
                 hashtags, tier, quick_info, faq, forecast_text, seasonal_text,
                 sensory_text, pdf_url, video_url, top_slot, backed_up_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(sku)
            .bind(&product.feed.name)
            .bind(&product.marketing.claim)
            .bind(&product.marketing.target_audience)
            .bind(&product.marketing.social_copy)
            .bind(&product.marketing.hashtags)
            .bind(&product.marketing.tier)
            .bind(&product.marketing.quick_info)
            .bind(&product.marketing.faq)
            .bind(&product.marketing.forecast_text)
            .bind(&product.marketing.seasonal_text)
            .bind(&product.marketing.sensory_text)
            .bind(&product.marketing.pdf_url)
            .bind(&product.marketing.video_url)
            .bind(product.marketing.top_slot)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            outcome.backed_up = true;
        }

        for asset in media {
            sqlx::query(
                r#"
                INSERT INTO media_backups
                (id, sku, blob_ref, filename, content_type, size_bytes, tag, backed_up_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(sku)
            .bind(&asset.blob_ref)
            .bind(&asset.filename)
            .bind(&asset.content_type)
            .bind(asset.size_bytes)
            .bind(&asset.tag)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            outcome.media_backed_up += 1;
        }

        sqlx::query("DELETE FROM product_media WHERE product_id = ?")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    /// The most recent marketing backup for a sku, if any.
    pub async fn latest_for_sku(&self, sku: &str) -> Result<Option<MarketingBackup>> {
        let sql = format!(
            "{} WHERE sku = ? ORDER BY backed_up_at DESC, id DESC LIMIT 1",
            SELECT_BACKUP_SQL
        );
        let row = sqlx::query(&sql)
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| map_backup(&r)))
    }

    /// All marketing backups, newest first.
    pub async fn list_backups(&self) -> Result<Vec<MarketingBackup>> {
        let sql = format!("{} ORDER BY backed_up_at DESC, id DESC", SELECT_BACKUP_SQL);
        let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
        Ok(rows.iter().map(map_backup).collect())
    }

    /// Gallery snapshots for a sku, in backup order.
    pub async fn media_for_sku(&self, sku: &str) -> Result<Vec<MediaBackup>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sku, blob_ref, filename, content_type, size_bytes, tag, backed_up_at
            FROM media_backups
            WHERE sku = ?
            ORDER BY backed_up_at, id
            "#,
        )
        .bind(sku)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(map_media_backup).collect())
    }

    pub async fn stats(&self) -> Result<BackupStats> {
        let skus_with_backup: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT sku) FROM marketing_backups")
                .fetch_one(&*self.pool)
                .await?;
        let marketing_backups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marketing_backups")
            .fetch_one(&*self.pool)
            .await?;
        let media_backups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_backups")
            .fetch_one(&*self.pool)
            .await?;

        Ok(BackupStats {
            skus_with_backup,
            marketing_backups,
            media_backups,
        })
    }
}

fn map_backup(row: &SqliteRow) -> MarketingBackup {
    MarketingBackup {
        id: row.get("id"),
        sku: row.get("sku"),
        original_name: row.get("original_name"),
        marketing: MarketingFields {
            claim: row.get("claim"),
            target_audience: row.get("target_audience"),
            social_copy: row.get("social_copy"),
            hashtags: row.get("hashtags"),
            tier: row.get("tier"),
            quick_info: row.get("quick_info"),
            faq: row.get("faq"),
            forecast_text: row.get("forecast_text"),
            seasonal_text: row.get("seasonal_text"),
            sensory_text: row.get("sensory_text"),
            pdf_url: row.get("pdf_url"),
            video_url: row.get("video_url"),
            top_slot: row.get("top_slot"),
        },
        backed_up_at: row.get("backed_up_at"),
    }
}

fn map_media_backup(row: &SqliteRow) -> MediaBackup {
    MediaBackup {
        id: row.get("id"),
        sku: row.get("sku"),
        blob_ref: row.get("blob_ref"),
        filename: row.get("filename"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        tag: row.get("tag"),
        backed_up_at: row.get("backed_up_at"),
    }
}
