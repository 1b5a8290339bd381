//! Data models for sake-sync
//!
//! - Source payloads as returned by the catalog provider
//! - Candidate records built fresh each run
//! - Durable master records, history entries, generations and summaries

pub mod candidate;
pub mod catalog;
pub mod change_set;
pub mod generation;
pub mod history;
pub mod master;
pub mod summary;

pub use candidate::{CandidateRecord, FlavorProfile, FLAVOR_VECTOR_LEN};
pub use catalog::{
    BrandEntry, BrandsResponse, BreweriesResponse, BreweryEntry, CatalogSnapshot,
    FlavorChartEntry, FlavorChartsResponse,
};
pub use change_set::{ChangeSet, RecordUpdate};
pub use generation::{ChangeCounts, Generation, GenerationStatus, DRY_RUN_GENERATION_ID};
pub use history::{ChangeOperation, HistoryEntry};
pub use master::{MasterRecord, RecordSnapshot, RECORD_FIELDS};
pub use summary::{ChangeSummary, Severity};
