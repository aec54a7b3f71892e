//! # LedgerSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The HTTP transport and the remote accounting API client
//! - The retry scheduler driving automatic re-attempts
//! - Configuration loading from environment and files
//! - In-memory port implementations for tests and embedders
//!
//! ## Architecture
//! - Implements traits defined in `ledgersync-core`
//! - Depends on `ledgersync-common`, `ledgersync-domain`, and
//!   `ledgersync-core`
//! - Contains all "impure" code (I/O, HTTP)

pub mod config;
pub mod http;
pub mod remote;
pub mod repositories;
pub mod scheduling;

// Re-export commonly used items
pub use http::{HttpClient, HttpClientConfig};
pub use remote::RemoteClient;
pub use repositories::{
    MemoryLocalCatalog, MemoryMappingStore, MemoryOrderRepository, MemorySyncStateRepository,
    TracingNotifier,
};
pub use scheduling::{RetryScheduler, RetrySchedulerConfig};
