//! Test Helper Utilities
//!
//! Shared utilities for testing sake-sync

#![allow(dead_code)]

pub mod db_utils;
pub mod fake_source;

pub use db_utils::{count_rows, create_test_db, create_test_orchestrator, report_files};
pub use fake_source::{brand, brewery, chart, FakeCatalogSource};
