//! Backup entities for purged products
//!
//! When an orphaned product is purged, its curated marketing content and its
//! gallery references are snapshotted into append-only backup tables keyed by
//! sku. If the article later reappears in the feed (or an operator recreates
//! it manually), the snapshot can be restored onto the new product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::product::MarketingFields;

/// Snapshot of a purged product's marketing fields.
///
/// Many backups may exist per sku; restore always picks the most recent one.
/// History is never pruned.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MarketingBackup {
    pub id: String,
    pub sku: String,
    /// Product name at purge time, kept so operators can recognize the
    /// backup after the live row is gone.
    pub original_name: String,
    pub marketing: MarketingFields,
    pub backed_up_at: DateTime<Utc>,
}

/// Snapshot of one gallery asset of a purged product.
///
/// Carries the same opaque `blob_ref` as the live media row did; the blob
/// itself is never copied or deleted, so the reference stays valid.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MediaBackup {
    pub id: String,
    pub sku: String,
    pub blob_ref: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub tag: Option<String>,
    pub backed_up_at: DateTime<Utc>,
}

/// Aggregate counts over the backup tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupStats {
    /// Distinct skus with at least one marketing backup.
    pub skus_with_backup: i64,
    pub marketing_backups: i64,
    pub media_backups: i64,
}

/// Outcome of backing up and purging a single product.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurgeOutcome {
    /// Whether a marketing backup row was written. False for products with
    /// no curated content.
    pub backed_up: bool,
    /// Number of gallery assets snapshotted into media backups.
    pub media_backed_up: u32,
}
