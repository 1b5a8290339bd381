//! sake-sync library interface
//!
//! Catalog synchronization engine: fetches the provider catalog, detects
//! changes against the versioned master dataset and applies them with a full
//! audit trail. The binary in `main.rs` is a thin wrapper over
//! [`services::SyncOrchestrator`]; everything is exposed here for integration
//! tests.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{FetchError, RunStage, SyncError, SyncResult};

/// Build identification recorded by the build script
pub mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const GIT_HASH: &str = env!("SAKE_SYNC_GIT_HASH");
    pub const BUILT_AT: &str = env!("SAKE_SYNC_BUILT_AT");
    pub const PROFILE: &str = env!("SAKE_SYNC_PROFILE");
}
