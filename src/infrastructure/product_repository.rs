//! Repository for catalog products and their gallery media
//!
//! The write surface mirrors the field ownership split: `upsert_from_feed`
//! accepts only feed-owned fields and its SQL never mentions a marketing
//! column, while `apply_marketing` touches only marketing columns. Sync
//! cannot clobber curated content because no statement exists that could.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::domain::product::{
    CatalogProduct, FeedFields, MarketingFields, ProductMedia, UpsertOutcome,
};

const SELECT_PRODUCT_SQL: &str = r#"
    SELECT id, sku, name, description, image_url, price, available, brand,
           category, subcategory, product_url, synced_at,
           claim, target_audience, social_copy, hashtags, tier, quick_info,
           faq, forecast_text, seasonal_text, sensory_text, pdf_url, video_url,
           top_slot, created_at, updated_at
    FROM products
"#;

/// Columns that decide whether a product carries curated content.
const HAS_MARKETING_SQL: &str = r#"(
       (claim IS NOT NULL AND TRIM(claim) != '')
    OR (target_audience IS NOT NULL AND TRIM(target_audience) != '')
    OR (social_copy IS NOT NULL AND TRIM(social_copy) != '')
    OR (hashtags IS NOT NULL AND TRIM(hashtags) != '')
    OR (tier IS NOT NULL AND TRIM(tier) != '')
    OR (quick_info IS NOT NULL AND TRIM(quick_info) != '')
    OR (faq IS NOT NULL AND TRIM(faq) != '')
    OR (forecast_text IS NOT NULL AND TRIM(forecast_text) != '')
    OR (seasonal_text IS NOT NULL AND TRIM(seasonal_text) != '')
    OR (sensory_text IS NOT NULL AND TRIM(sensory_text) != '')
    OR (pdf_url IS NOT NULL AND TRIM(pdf_url) != '')
    OR (video_url IS NOT NULL AND TRIM(video_url) != '')
    OR top_slot IS NOT NULL
)"#;

/// Repository for the products and product_media tables
#[derive(Clone)]
pub struct ProductRepository {
    pool: Arc<SqlitePool>,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    // ===============================
    // FEED WRITE PATH
    // ===============================

    /// Insert or update a product from feed data.
    ///
    /// Matching is by sku. New products start with empty marketing fields;
    /// updates patch the feed-owned columns only and stamp `synced_at`.
    pub async fn upsert_from_feed(&self, fields: &FeedFields) -> Result<UpsertOutcome> {
        let sku = fields
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("feed fields carry no sku"))?;

        let now = Utc::now();
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await?;

        match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET name = ?, description = ?, image_url = ?, price = ?,
                        available = ?, brand = ?, category = ?, subcategory = ?,
                        product_url = ?, synced_at = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&fields.name)
                .bind(&fields.description)
                .bind(&fields.image_url)
                .bind(fields.price)
                .bind(fields.available)
                .bind(&fields.brand)
                .bind(&fields.category)
                .bind(&fields.subcategory)
                .bind(&fields.product_url)
                .bind(now)
                .bind(now)
                .bind(&id)
                .execute(&*self.pool)
                .await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO products
                    (id, sku, name, description, image_url, price, available,
                     brand, category, subcategory, product_url, synced_at,
                     created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(sku)
                .bind(&fields.name)
                .bind(&fields.description)
                .bind(&fields.image_url)
                .bind(fields.price)
                .bind(fields.available)
                .bind(&fields.brand)
                .bind(&fields.category)
                .bind(&fields.subcategory)
                .bind(&fields.product_url)
                .bind(now)
                .bind(now)
                .bind(now)
                .execute(&*self.pool)
                .await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }

    // ===============================
    // MARKETING WRITE PATH
    // ===============================

    /// Replace a product's marketing fields. Used by the catalog editor and
    /// by backup restoration; never by the reconciler.
    pub async fn apply_marketing(
        &self,
        product_id: &str,
        marketing: &MarketingFields,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET claim = ?, target_audience = ?, social_copy = ?, hashtags = ?,
                tier = ?, quick_info = ?, faq = ?, forecast_text = ?,
                seasonal_text = ?, sensory_text = ?, pdf_url = ?, video_url = ?,
                top_slot = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&marketing.claim)
        .bind(&marketing.target_audience)
        .bind(&marketing.social_copy)
        .bind(&marketing.hashtags)
        .bind(&marketing.tier)
        .bind(&marketing.quick_info)
        .bind(&marketing.faq)
        .bind(&marketing.forecast_text)
        .bind(&marketing.seasonal_text)
        .bind(&marketing.sensory_text)
        .bind(&marketing.pdf_url)
        .bind(&marketing.video_url)
        .bind(marketing.top_slot)
        .bind(Utc::now())
        .bind(product_id)
        .execute(&*self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Product not found: {}", product_id));
        }
        Ok(())
    }

    /// Create a product without a sku (manual catalog entry). Such products
    /// are invisible to the reconciler and can never become orphans.
    pub async fn create_product(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<CatalogProduct> {
        let now = Utc::now();
        let product = CatalogProduct {
            id: Uuid::new_v4().to_string(),
            feed: FeedFields {
                sku: None,
                name: name.to_string(),
                description: description.map(str::to_string),
                ..FeedFields::default()
            },
            marketing: MarketingFields::default(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, available, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.feed.name)
        .bind(&product.feed.description)
        .bind(product.feed.available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await?;

        Ok(product)
    }

    // ===============================
    // QUERIES
    // ===============================

    pub async fn get_product(&self, id: &str) -> Result<Option<CatalogProduct>> {
        let sql = format!("{} WHERE id = ?", SELECT_PRODUCT_SQL);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| map_product(&r)))
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>> {
        let sql = format!("{} WHERE sku = ?", SELECT_PRODUCT_SQL);
        let row = sqlx::query(&sql)
            .bind(sku)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| map_product(&r)))
    }

    /// All products joined to the feed by a usable sku, in sku order. This
    /// is the candidate set for orphan detection.
    pub async fn list_with_sku(&self) -> Result<Vec<CatalogProduct>> {
        let sql = format!(
            "{} WHERE sku IS NOT NULL AND TRIM(sku) != '' ORDER BY sku",
            SELECT_PRODUCT_SQL
        );
        let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
        Ok(rows.iter().map(map_product).collect())
    }

    /// Case-insensitive substring search over product names.
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<CatalogProduct>> {
        let sql = format!("{} WHERE name LIKE ? ORDER BY name LIMIT 50", SELECT_PRODUCT_SQL);
        let rows = sqlx::query(&sql)
            .bind(format!("%{}%", query))
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows.iter().map(map_product).collect())
    }

    pub async fn count_products(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&*self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_with_marketing(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM products WHERE {}", HAS_MARKETING_SQL);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&*self.pool).await?;
        Ok(count)
    }

    // ===============================
    // MEDIA OPERATIONS
    // ===============================

    /// Attach a gallery asset to a product. The blob itself must already
    /// exist in the blob store; only the reference is recorded.
    pub async fn attach_media(&self, media: &ProductMedia) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_media
            (id, product_id, blob_ref, filename, content_type, size_bytes, tag, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media.id)
        .bind(&media.product_id)
        .bind(&media.blob_ref)
        .bind(&media.filename)
        .bind(&media.content_type)
        .bind(media.size_bytes)
        .bind(&media.tag)
        .bind(media.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_media(&self, product_id: &str) -> Result<Vec<ProductMedia>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, blob_ref, filename, content_type, size_bytes, tag, created_at
            FROM product_media
            WHERE product_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.iter().map(map_media).collect())
    }
}

fn map_product(row: &SqliteRow) -> CatalogProduct {
    CatalogProduct {
        id: row.get("id"),
        feed: FeedFields {
            sku: row.get("sku"),
            name: row.get("name"),
            description: row.get("description"),
            image_url: row.get("image_url"),
            price: row.get("price"),
            available: row.get("available"),
            brand: row.get("brand"),
            category: row.get("category"),
            subcategory: row.get("subcategory"),
            product_url: row.get("product_url"),
            synced_at: row.get("synced_at"),
        },
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
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) fn map_media(row: &SqliteRow) -> ProductMedia {
    ProductMedia {
        id: row.get("id"),
        product_id: row.get("product_id"),
        blob_ref: row.get("blob_ref"),
        filename: row.get("filename"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        tag: row.get("tag"),
        created_at: row.get("created_at"),
    }
}
