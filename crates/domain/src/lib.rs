//! # LedgerSync Domain
//!
//! Business domain types and models for LedgerSync.
//!
//! This crate contains:
//! - Domain data types (Order, SyncState, Mapping, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other LedgerSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
