//! Application layer - boundary operations over the catalog
//!
//! This module contains the use-case services that implement the sync,
//! orphan-check, purge, restore and search operations, the DTOs they
//! exchange with the admin frontend, and the application state wiring.

pub mod dto;
pub mod state;
pub mod use_cases;

// Re-export commonly used items
pub use state::AppState;
pub use use_cases::{BackupUseCases, OrphanUseCases, SyncUseCases};
