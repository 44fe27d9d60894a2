//! Application use cases for feed reconciliation
//!
//! Contains the boundary operations: sync, orphan detection, backup/purge,
//! restore and search. Fatal conditions (unreachable feed, invalid input)
//! bubble up as errors before any mutation; per-record failures are logged
//! and absorbed so one bad record never blocks the rest of a run.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::dto::{
    BackupStatsDto, BackupSummaryDto, OrphanCheckDto, OrphanedProductDto, ProductHitDto,
    PurgeResultDto, RestoreResultDto, SyncResultDto, SyncStatusDto,
};
use crate::domain::product::{FeedFields, ProductMedia, UpsertOutcome};
use crate::domain::services::FeedProvider;
use crate::domain::taxonomy::extract_taxonomy;
use crate::infrastructure::backup_repository::BackupRepository;
use crate::infrastructure::product_repository::ProductRepository;
use crate::infrastructure::sync_run_repository::{SyncRun, SyncRunRepository, STATUS_FAILED};
use crate::infrastructure::taxonomy_repository::TaxonomyRepository;

// ============================================================================
// Sync
// ============================================================================

/// Reconciliation of the feed into the catalog, plus the status view.
pub struct SyncUseCases {
    feed: Arc<dyn FeedProvider>,
    products: ProductRepository,
    taxonomy: TaxonomyRepository,
    sync_runs: SyncRunRepository,
}

impl SyncUseCases {
    pub fn new(
        feed: Arc<dyn FeedProvider>,
        products: ProductRepository,
        taxonomy: TaxonomyRepository,
        sync_runs: SyncRunRepository,
    ) -> Self {
        Self {
            feed,
            products,
            taxonomy,
            sync_runs,
        }
    }

    /// Pull the feed and upsert it into the catalog.
    ///
    /// Items are processed strictly in feed order, so a pull containing the
    /// same sku twice ends with the later occurrence's values. Only
    /// feed-owned fields are written; curated marketing content is
    /// untouched by construction. A failed fetch aborts before any
    /// mutation. Concurrent syncs are not locked against each other; both
    /// writers agree on the feed state, so the race is last-write-wins on
    /// feed-owned columns.
    pub async fn sync_from_feed(&self, feed_url: &str, limit: Option<u32>) -> Result<SyncResultDto> {
        if feed_url.trim().is_empty() {
            return Err(anyhow!("Feed URL is required"));
        }

        let started_at = Utc::now();
        let feed = match self.feed.fetch(feed_url).await {
            Ok(feed) => feed,
            Err(e) => {
                // The aborted pull still lands in the run history; it just
                // never becomes the last completed sync.
                let mut run = SyncRun::new(feed_url, started_at);
                run.status = STATUS_FAILED.to_string();
                run.finished_at = Utc::now();
                if let Err(record_err) = self.sync_runs.record(&run).await {
                    warn!("⚠️ Failed to record failed sync run: {}", record_err);
                }
                return Err(e.into());
            }
        };

        let take = limit.map_or(feed.items.len(), |n| n as usize);
        let mut created: u32 = 0;
        let mut updated: u32 = 0;

        for item in feed.items.iter().take(take) {
            let fields = FeedFields::from(item.clone());
            match self.products.upsert_from_feed(&fields).await {
                Ok(UpsertOutcome::Created) => created += 1,
                Ok(UpsertOutcome::Updated) => updated += 1,
                Err(e) => {
                    warn!("⚠️ Upsert failed for sku {}: {}", item.sku, e);
                }
            }
        }

        // The taxonomy cache reflects the whole pull, not the limited slice
        // actually reconciled.
        let taxonomy = extract_taxonomy(&feed.items);
        if let Err(e) = self.taxonomy.replace(&taxonomy).await {
            warn!("⚠️ Taxonomy cache update failed: {}", e);
        }

        let total = created + updated;
        let mut run = SyncRun::new(feed_url, started_at);
        run.items_total = i64::from(total);
        run.created_count = i64::from(created);
        run.updated_count = i64::from(updated);
        run.dropped_count = i64::from(feed.dropped);
        run.finished_at = Utc::now();
        if let Err(e) = self.sync_runs.record(&run).await {
            warn!("⚠️ Failed to record sync run: {}", e);
        }

        info!(
            "✅ Sync complete: {} created, {} updated, {} dropped",
            created, updated, feed.dropped
        );
        Ok(SyncResultDto {
            success: true,
            created,
            updated,
            total_products: total,
        })
    }

    /// Catalog counts and the timestamp of the latest completed sync.
    pub async fn get_sync_status(&self) -> Result<SyncStatusDto> {
        let total_products = self.products.count_products().await?;
        let with_marketing_data = self.products.count_with_marketing().await?;
        let last_sync = self
            .sync_runs
            .latest_completed()
            .await?
            .map(|run| run.finished_at);

        Ok(SyncStatusDto {
            total_products,
            with_marketing_data,
            last_sync,
        })
    }
}

// ============================================================================
// Orphans
// ============================================================================

/// Detection and operator-confirmed purge of orphaned products.
pub struct OrphanUseCases {
    feed: Arc<dyn FeedProvider>,
    products: ProductRepository,
    backups: BackupRepository,
}

impl OrphanUseCases {
    pub fn new(
        feed: Arc<dyn FeedProvider>,
        products: ProductRepository,
        backups: BackupRepository,
    ) -> Self {
        Self {
            feed,
            products,
            backups,
        }
    }

    /// List catalog products whose sku is absent from a fresh feed pull.
    ///
    /// Always re-fetches; a stale key set could misclassify products that
    /// reappeared since the last sync. Read-only and safe to repeat.
    pub async fn check_orphaned_products(&self, feed_url: &str) -> Result<OrphanCheckDto> {
        if feed_url.trim().is_empty() {
            return Err(anyhow!("Feed URL is required"));
        }

        let feed = self.feed.fetch(feed_url).await?;
        let live_skus: HashSet<&str> = feed.items.iter().map(|item| item.sku.as_str()).collect();

        let mut orphaned_products = Vec::new();
        for product in self.products.list_with_sku().await? {
            let Some(sku) = product.feed.sku.as_deref() else {
                continue;
            };
            if live_skus.contains(sku) {
                continue;
            }
            orphaned_products.push(OrphanedProductDto {
                id: product.id,
                sku: sku.to_string(),
                name: product.feed.name,
                has_marketing_data: !product.marketing.is_empty(),
            });
        }

        info!(
            "🔍 Orphan check: {} feed skus, {} orphaned products",
            live_skus.len(),
            orphaned_products.len()
        );
        Ok(OrphanCheckDto {
            feed_skus_count: live_skus.len() as u32,
            orphaned_products,
        })
    }

    /// Back up and delete the given products.
    ///
    /// The only path that permanently removes a catalog product. Each
    /// product's snapshot commits before its delete; a failure on one
    /// product does not block the others.
    pub async fn delete_orphaned_products(&self, product_ids: &[String]) -> Result<PurgeResultDto> {
        if product_ids.is_empty() {
            return Err(anyhow!("No products selected for deletion"));
        }

        let mut deleted: u32 = 0;
        let mut backed_up: u32 = 0;

        for product_id in product_ids {
            let product = match self.products.get_product(product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    warn!("⚠️ Purge skipped, product not found: {}", product_id);
                    continue;
                }
                Err(e) => {
                    warn!("⚠️ Purge failed loading product {}: {}", product_id, e);
                    continue;
                }
            };

            let media = match self.products.list_media(product_id).await {
                Ok(media) => media,
                Err(e) => {
                    warn!("⚠️ Purge failed listing media for {}: {}", product_id, e);
                    continue;
                }
            };

            match self.backups.backup_and_purge(&product, &media).await {
                Ok(outcome) => {
                    deleted += 1;
                    if outcome.backed_up {
                        backed_up += 1;
                    }
                    info!(
                        "🗑️ Purged {} ({} media snapshots)",
                        product_id, outcome.media_backed_up
                    );
                }
                Err(e) => {
                    warn!("⚠️ Purge failed for {}: {}", product_id, e);
                }
            }
        }

        Ok(PurgeResultDto { deleted, backed_up })
    }
}

// ============================================================================
// Backups & Restore
// ============================================================================

/// Backup inspection, product search, and snapshot restoration.
pub struct BackupUseCases {
    products: ProductRepository,
    backups: BackupRepository,
}

impl BackupUseCases {
    pub fn new(products: ProductRepository, backups: BackupRepository) -> Self {
        Self { products, backups }
    }

    pub async fn get_backup_stats(&self) -> Result<BackupStatsDto> {
        let stats = self.backups.stats().await?;
        Ok(BackupStatsDto::from(stats))
    }

    pub async fn list_marketing_backups(&self) -> Result<Vec<BackupSummaryDto>> {
        let backups = self.backups.list_backups().await?;
        Ok(backups.into_iter().map(BackupSummaryDto::from).collect())
    }

    /// Free-text name search over live products, used to pick a restore
    /// target when the original sku no longer applies.
    pub async fn find_product_by_name(&self, query: &str) -> Result<Vec<ProductHitDto>> {
        if query.trim().is_empty() {
            return Err(anyhow!("Search query cannot be empty"));
        }

        let products = self.products.search_by_name(query.trim()).await?;
        Ok(products.into_iter().map(ProductHitDto::from).collect())
    }

    /// Merge the most recent backup for `backup_key` onto the target product
    /// and re-materialize its gallery snapshots as live media rows.
    ///
    /// Restore overwrites the target's marketing fields; operators are
    /// expected to pick an empty or placeholder target. Restoring the same
    /// backup twice duplicates media rows; this is accepted and documented
    /// rather than silently guarded against.
    pub async fn restore_backup_to_product(
        &self,
        target_product_id: &str,
        backup_key: &str,
    ) -> Result<RestoreResultDto> {
        if target_product_id.trim().is_empty() {
            return Err(anyhow!("Target product id is required"));
        }
        if backup_key.trim().is_empty() {
            return Err(anyhow!("Backup key is required"));
        }

        let Some(backup) = self.backups.latest_for_sku(backup_key.trim()).await? else {
            return Ok(RestoreResultDto::failed("no backup found"));
        };
        let Some(target) = self.products.get_product(target_product_id.trim()).await? else {
            return Ok(RestoreResultDto::failed("target product not found"));
        };

        let merged = target.marketing.merged_with(&backup.marketing);
        self.products.apply_marketing(&target.id, &merged).await?;

        let mut gallery_images: u32 = 0;
        for snapshot in self.backups.media_for_sku(&backup.sku).await? {
            let media = ProductMedia {
                id: Uuid::new_v4().to_string(),
                product_id: target.id.clone(),
                blob_ref: snapshot.blob_ref,
                filename: snapshot.filename,
                content_type: snapshot.content_type,
                size_bytes: snapshot.size_bytes,
                tag: snapshot.tag,
                created_at: Utc::now(),
            };
            self.products.attach_media(&media).await?;
            gallery_images += 1;
        }

        info!(
            "♻️ Restored backup {} onto product {} ({} gallery images)",
            backup.sku, target.id, gallery_images
        );
        Ok(RestoreResultDto::restored(gallery_images))
    }
}
