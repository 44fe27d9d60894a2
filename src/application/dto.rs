//! Data Transfer Objects for the catalog boundary operations
//!
//! These are the exact shapes exchanged with the admin frontend; all of
//! them serialize camelCase and export TypeScript definitions.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::backup::{BackupStats, MarketingBackup};
use crate::domain::product::CatalogProduct;

/// How much of the claim is shown in backup listings.
const CLAIM_PREVIEW_LEN: usize = 80;

// ============================================================================
// Sync DTOs
// ============================================================================

/// Result of one `sync_from_feed` call.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SyncResultDto {
    pub success: bool,
    pub created: u32,
    pub updated: u32,
    /// Items successfully processed, after dropping malformed entries and
    /// applying the optional limit.
    pub total_products: u32,
}

/// Snapshot of the catalog for the status view.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SyncStatusDto {
    pub total_products: i64,
    pub with_marketing_data: i64,
    pub last_sync: Option<DateTime<Utc>>,
}

// ============================================================================
// Orphan DTOs
// ============================================================================

/// One catalog product whose sku vanished from the feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrphanedProductDto {
    pub id: String,
    pub sku: String,
    pub name: String,
    /// Warns the operator that deleting this product will trigger a
    /// marketing backup; it never changes the deletion decision.
    pub has_marketing_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrphanCheckDto {
    /// Distinct skus seen in the fresh feed pull.
    pub feed_skus_count: u32,
    pub orphaned_products: Vec<OrphanedProductDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurgeResultDto {
    pub deleted: u32,
    pub backed_up: u32,
}

// ============================================================================
// Backup & Restore DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BackupStatsDto {
    pub skus_with_backup: i64,
    pub marketing_backups: i64,
    pub gallery_backups: i64,
}

impl From<BackupStats> for BackupStatsDto {
    fn from(stats: BackupStats) -> Self {
        Self {
            skus_with_backup: stats.skus_with_backup,
            marketing_backups: stats.marketing_backups,
            gallery_backups: stats.media_backups,
        }
    }
}

/// Listing row for one marketing backup.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BackupSummaryDto {
    pub sku: String,
    pub original_name: String,
    pub tier: Option<String>,
    pub claim_preview: Option<String>,
    pub backed_up_at: DateTime<Utc>,
}

impl From<MarketingBackup> for BackupSummaryDto {
    fn from(backup: MarketingBackup) -> Self {
        Self {
            sku: backup.sku,
            original_name: backup.original_name,
            tier: backup.marketing.tier,
            claim_preview: backup.marketing.claim.map(|claim| preview(&claim)),
            backed_up_at: backup.backed_up_at,
        }
    }
}

/// Search hit for the restore target picker.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductHitDto {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
}

impl From<CatalogProduct> for ProductHitDto {
    fn from(product: CatalogProduct) -> Self {
        Self {
            id: product.id,
            name: product.feed.name,
            sku: product.feed.sku,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RestoreResultDto {
    pub restored: bool,
    /// Human-readable reason when `restored` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Gallery rows re-materialized onto the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_images: Option<u32>,
}

impl RestoreResultDto {
    pub fn failed(reason: &str) -> Self {
        Self {
            restored: false,
            reason: Some(reason.to_string()),
            gallery_images: None,
        }
    }

    pub fn restored(gallery_images: u32) -> Self {
        Self {
            restored: true,
            reason: None,
            gallery_images: Some(gallery_images),
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= CLAIM_PREVIEW_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(CLAIM_PREVIEW_LEN).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::MarketingFields;

    #[test]
    fn backup_summary_truncates_long_claims() {
        let backup = MarketingBackup {
            id: "b1".to_string(),
            sku: "A-1".to_string(),
            original_name: "Espresso Cup".to_string(),
            marketing: MarketingFields {
                claim: Some("x".repeat(200)),
                tier: Some("A".to_string()),
                ..MarketingFields::default()
            },
            backed_up_at: Utc::now(),
        };

        let summary = BackupSummaryDto::from(backup);
        let claim_preview = summary.claim_preview.unwrap();
        assert_eq!(claim_preview.chars().count(), CLAIM_PREVIEW_LEN + 1);
        assert!(claim_preview.ends_with('…'));
        assert_eq!(summary.tier.as_deref(), Some("A"));
    }

    #[test]
    fn restore_result_serializes_without_empty_fields() {
        let ok = serde_json::to_value(RestoreResultDto::restored(2)).unwrap();
        assert_eq!(ok["restored"], true);
        assert_eq!(ok["galleryImages"], 2);
        assert!(ok.get("reason").is_none());

        let failed = serde_json::to_value(RestoreResultDto::failed("no backup found")).unwrap();
        assert_eq!(failed["restored"], false);
        assert_eq!(failed["reason"], "no backup found");
        assert!(failed.get("galleryImages").is_none());
    }
}
