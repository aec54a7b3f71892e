//! Port interfaces for mapping persistence and the local catalog.

use async_trait::async_trait;
use ledgersync_domain::{LocalEntity, Mapping, MappingKind, Result};

/// Persistence for mapping tables, one table per [`MappingKind`].
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// All mappings of a kind.
    async fn get_all(&self, kind: MappingKind) -> Result<Vec<Mapping>>;

    /// One mapping by local key, `None` when unmapped.
    async fn get(&self, kind: MappingKind, local_key: &str) -> Result<Option<Mapping>>;

    /// Create or overwrite the mapping for `mapping.local_key`.
    async fn set(&self, kind: MappingKind, mapping: &Mapping) -> Result<()>;

    /// Remove a mapping; removing a missing key is not an error.
    async fn remove(&self, kind: MappingKind, local_key: &str) -> Result<()>;
}

/// Read access to the local entities eligible for mapping.
#[async_trait]
pub trait LocalCatalog: Send + Sync {
    /// Local entities of a kind (products for `Item`, order fields for
    /// `CustomField`).
    async fn list_entities(&self, kind: MappingKind) -> Result<Vec<LocalEntity>>;
}
