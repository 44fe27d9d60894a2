//! catalog-sync - feed reconciliation for a curated product catalog
//!
//! Keeps a locally owned product catalog in sync with an externally
//! published product feed while preserving manually curated marketing
//! content, and recovers that content when a product disappears from the
//! feed and later reappears.
//!
//! The catalog splits every product into feed-owned fields (overwritten on
//! every sync) and marketing-owned fields (written only by operators and by
//! backup restoration); orphaned products are snapshotted into append-only
//! backup tables before deletion.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the boundary surface for embedding callers
pub use application::{AppState, BackupUseCases, OrphanUseCases, SyncUseCases};
pub use domain::{CatalogProduct, FeedItem, FeedProvider, MarketingBackup};
