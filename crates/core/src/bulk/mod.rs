//! Bulk synchronization of many orders.

pub mod orchestrator;

pub use orchestrator::{BulkOrchestrator, BulkProgress, BulkRun, BulkSummary};
