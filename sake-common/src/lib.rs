//! # Sake Common Library
//!
//! Shared code for the sake catalog tools including:
//! - Error types
//! - Configuration loading and root folder resolution
//! - Database initialization and schema
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
