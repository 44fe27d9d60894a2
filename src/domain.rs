//! Domain module - Core entities and business rules
//!
//! This module contains the catalog entities, the feed dialect, the
//! taxonomy projection and the service seams used by the application layer.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod backup;
pub mod feed;
pub mod product;
pub mod services;
pub mod taxonomy;

// Re-export commonly used items for convenience
// Note: Be specific about re-exports to avoid ambiguous glob warnings
pub use backup::{BackupStats, MarketingBackup, MediaBackup, PurgeOutcome};
pub use feed::{FeedError, FeedItem, ParsedFeed};
pub use product::{CatalogProduct, FeedFields, MarketingFields, ProductMedia, UpsertOutcome};
pub use services::FeedProvider;
pub use taxonomy::{extract_taxonomy, Taxonomy};
