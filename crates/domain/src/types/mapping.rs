//! Local-to-remote entity mappings.

use serde::{Deserialize, Serialize};

/// The kind of entity a mapping table correlates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// Local product to remote item.
    Item,
    /// Local order field to remote custom field.
    CustomField,
}

/// One correspondence between a local entity and a remote one.
///
/// Mappings are unique per `local_key` and overwritten on re-save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub local_key: String,
    pub remote_id: String,
    pub remote_label: String,
    pub remote_type: Option<String>,
}

/// A local entity eligible for mapping (product or field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEntity {
    /// Mapping key, e.g. the product id rendered as a string.
    pub key: String,
    pub name: String,
    /// SKU when the entity has one; auto-mapping only considers
    /// non-empty SKUs.
    #[serde(default)]
    pub sku: String,
}

/// An item as listed by the remote accounting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    pub rate: Option<f64>,
}
