//! Application configuration structures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Datacenter, OrderStatus, RetryPolicy, SyncAction};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Regional datacenter of the connected accounting account.
    #[serde(default)]
    pub datacenter: Datacenter,
    /// Remote organization identifier (one per installation).
    pub organization_id: String,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Sync engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Order-status transitions that trigger a remote action.
    #[serde(default)]
    pub triggers: HashMap<OrderStatus, SyncAction>,
    /// Whether manual "sync now" defaults to draft invoices.
    #[serde(default)]
    pub as_draft_default: bool,
    /// Seconds remote item listings stay cached before re-fetch.
    #[serde(default = "default_item_cache_ttl")]
    pub item_cache_ttl_secs: u64,
}

fn default_item_cache_ttl() -> u64 {
    300
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            triggers: HashMap::new(),
            as_draft_default: false,
            item_cache_ttl_secs: default_item_cache_ttl(),
        }
    }
}

impl SyncConfig {
    /// The action configured for an order status, if any.
    #[must_use]
    pub fn action_for(&self, status: OrderStatus) -> Option<SyncAction> {
        self.triggers.get(&status).copied()
    }
}
