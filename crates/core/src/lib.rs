//! # LedgerSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) over the host platform and the
//!   remote accounting API
//! - The per-order synchronization engine and its state machine
//! - Entity-mapping resolution including SKU auto-matching
//! - Bulk orchestration with progress reporting and cancellation
//!
//! ## Architecture Principles
//! - Only depends on `ledgersync-common` and `ledgersync-domain`
//! - No HTTP or platform code; all external dependencies via traits
//! - Pure, testable business logic

pub mod bulk;
pub mod mapping;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use bulk::{BulkOrchestrator, BulkProgress, BulkRun, BulkSummary};
pub use mapping::ports::{LocalCatalog, MappingStore};
pub use mapping::MappingService;
pub use sync::ports::{
    AccountingApi, OrderRepository, OrderSyncer, SyncNotifier, SyncStateRepository,
};
pub use sync::OrderSyncEngine;
