//! Catalog product entities
//!
//! A catalog product is split into two field groups with distinct owners:
//! feed-owned fields are written exclusively by the reconciler, while
//! marketing fields are written exclusively by operators (and by backup
//! restoration). Keeping them in separate structs makes it impossible for
//! the sync path to touch curated content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Fields owned by the external product feed.
///
/// Every sync pass overwrites these on matched products. `sku` is the
/// identity key used to join feed items to catalog rows; manually created
/// products carry no sku and are invisible to the reconciler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FeedFields {
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub available: bool,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub product_url: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

/// Fields owned by operators through the catalog editor.
///
/// The reconciler never reads or writes these. They survive every sync and
/// are the payload of marketing backups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MarketingFields {
    pub claim: Option<String>,
    pub target_audience: Option<String>,
    pub social_copy: Option<String>,
    pub hashtags: Option<String>,
    pub tier: Option<String>,
    pub quick_info: Option<String>,
    pub faq: Option<String>,
    pub forecast_text: Option<String>,
    pub seasonal_text: Option<String>,
    pub sensory_text: Option<String>,
    pub pdf_url: Option<String>,
    pub video_url: Option<String>,
    pub top_slot: Option<i64>,
}

/// A product in the locally owned catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogProduct {
    pub id: String,
    #[serde(flatten)]
    pub feed: FeedFields,
    #[serde(flatten)]
    pub marketing: MarketingFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A gallery asset attached to a live product.
///
/// `blob_ref` is an opaque key into the external blob store. This subsystem
/// never dereferences or deletes blobs; it only tracks the references.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductMedia {
    pub id: String,
    pub product_id: String,
    pub blob_ref: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a single feed upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

fn is_blank(value: &Option<String>) -> bool {
    match value {
        Some(s) => s.trim().is_empty(),
        None => true,
    }
}

fn overlay(base: &Option<String>, over: &Option<String>) -> Option<String> {
    if is_blank(over) {
        base.clone()
    } else {
        over.clone()
    }
}

impl MarketingFields {
    /// True when no field carries operator content.
    ///
    /// Products with empty marketing fields are purged without writing a
    /// marketing backup (there is nothing worth preserving).
    pub fn is_empty(&self) -> bool {
        is_blank(&self.claim)
            && is_blank(&self.target_audience)
            && is_blank(&self.social_copy)
            && is_blank(&self.hashtags)
            && is_blank(&self.tier)
            && is_blank(&self.quick_info)
            && is_blank(&self.faq)
            && is_blank(&self.forecast_text)
            && is_blank(&self.seasonal_text)
            && is_blank(&self.sensory_text)
            && is_blank(&self.pdf_url)
            && is_blank(&self.video_url)
            && self.top_slot.is_none()
    }

    /// Merge `other` over `self`: every non-empty field of `other` overwrites
    /// the corresponding field here, empty fields leave the current value
    /// untouched. Used when restoring a backup onto a target product that may
    /// already carry partial content.
    pub fn merged_with(&self, other: &Self) -> Self {
        Self {
            claim: overlay(&self.claim, &other.claim),
            target_audience: overlay(&self.target_audience, &other.target_audience),
            social_copy: overlay(&self.social_copy, &other.social_copy),
            hashtags: overlay(&self.hashtags, &other.hashtags),
            tier: overlay(&self.tier, &other.tier),
            quick_info: overlay(&self.quick_info, &other.quick_info),
            faq: overlay(&self.faq, &other.faq),
            forecast_text: overlay(&self.forecast_text, &other.forecast_text),
            seasonal_text: overlay(&self.seasonal_text, &other.seasonal_text),
            sensory_text: overlay(&self.sensory_text, &other.sensory_text),
            pdf_url: overlay(&self.pdf_url, &other.pdf_url),
            video_url: overlay(&self.video_url, &other.video_url),
            top_slot: other.top_slot.or(self.top_slot),
        }
    }
}

impl CatalogProduct {
    /// True when the product is joined to the feed by a usable identity key.
    pub fn has_sku(&self) -> bool {
        matches!(&self.feed.sku, Some(s) if !s.trim().is_empty())
    }
}
