//! Synchronization services

pub mod catalog_client;
pub mod change_applier;
pub mod change_detector;
pub mod content_hasher;
pub mod coordinate_mapper;
pub mod generation_lifecycle;
pub mod reporter;
pub mod source_fetcher;
pub mod summary_builder;
pub mod sync_orchestrator;

pub use catalog_client::{CatalogSource, HttpCatalogSource};
pub use change_applier::ChangeApplier;
pub use change_detector::detect;
pub use content_hasher::content_hash;
pub use coordinate_mapper::map_coordinates;
pub use generation_lifecycle::GenerationLifecycle;
pub use reporter::{render_preview, Reporter};
pub use source_fetcher::{FetchStats, SourceDataFetcher};
pub use summary_builder::build_summary;
pub use sync_orchestrator::{RunOutcome, SyncOptions, SyncOrchestrator};
