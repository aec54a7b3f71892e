//! Port implementations over local storage.

pub mod memory;

pub use memory::{
    MemoryLocalCatalog, MemoryMappingStore, MemoryOrderRepository, MemorySyncStateRepository,
    TracingNotifier,
};
