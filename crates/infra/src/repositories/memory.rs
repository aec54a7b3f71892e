//! In-memory port implementations.
//!
//! Used by tests and by embedders that keep sync state in the host
//! platform's own storage and only need a process-local cache. Each
//! adapter is a thin map behind a lock.

use std::collections::HashMap;

use async_trait::async_trait;
use ledgersync_core::{
    LocalCatalog, MappingStore, OrderRepository, SyncNotifier, SyncStateRepository,
};
use ledgersync_domain::{
    LedgerSyncError, LocalEntity, Mapping, MappingKind, Order, OrderRefund, Result, SyncState,
    SyncStatus,
};
use parking_lot::RwLock;
use tracing::error;

/// Order source backed by a pre-seeded map.
#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<u64, Order>>,
    refunds: RwLock<HashMap<u64, Vec<OrderRefund>>>,
}

impl MemoryOrderRepository {
    pub fn insert_order(&self, order: Order) {
        self.orders.write().insert(order.id, order);
    }

    pub fn insert_refund(&self, order_id: u64, refund: OrderRefund) {
        self.refunds.write().entry(order_id).or_default().push(refund);
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn get_order(&self, order_id: u64) -> Result<Order> {
        self.orders
            .read()
            .get(&order_id)
            .cloned()
            .ok_or_else(|| LedgerSyncError::NotFound(format!("order {order_id}")))
    }

    async fn get_refunds(&self, order_id: u64) -> Result<Vec<OrderRefund>> {
        Ok(self.refunds.read().get(&order_id).cloned().unwrap_or_default())
    }
}

/// Sync-state store backed by a map.
#[derive(Default)]
pub struct MemorySyncStateRepository {
    states: RwLock<HashMap<u64, SyncState>>,
}

#[async_trait]
impl SyncStateRepository for MemorySyncStateRepository {
    async fn get(&self, order_id: u64) -> Result<Option<SyncState>> {
        Ok(self.states.read().get(&order_id).cloned())
    }

    async fn put(&self, state: &SyncState) -> Result<()> {
        self.states.write().insert(state.order_id, state.clone());
        Ok(())
    }

    async fn list_failed(&self) -> Result<Vec<SyncState>> {
        Ok(self
            .states
            .read()
            .values()
            .filter(|s| s.status == SyncStatus::Error)
            .cloned()
            .collect())
    }
}

/// Mapping tables backed by one map per kind.
#[derive(Default)]
pub struct MemoryMappingStore {
    tables: RwLock<HashMap<MappingKind, HashMap<String, Mapping>>>,
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    async fn get_all(&self, kind: MappingKind) -> Result<Vec<Mapping>> {
        Ok(self
            .tables
            .read()
            .get(&kind)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, kind: MappingKind, local_key: &str) -> Result<Option<Mapping>> {
        Ok(self.tables.read().get(&kind).and_then(|table| table.get(local_key).cloned()))
    }

    async fn set(&self, kind: MappingKind, mapping: &Mapping) -> Result<()> {
        self.tables
            .write()
            .entry(kind)
            .or_default()
            .insert(mapping.local_key.clone(), mapping.clone());
        Ok(())
    }

    async fn remove(&self, kind: MappingKind, local_key: &str) -> Result<()> {
        if let Some(table) = self.tables.write().get_mut(&kind) {
            table.remove(local_key);
        }
        Ok(())
    }
}

/// Local catalog backed by a pre-seeded list per kind.
#[derive(Default)]
pub struct MemoryLocalCatalog {
    entities: RwLock<HashMap<MappingKind, Vec<LocalEntity>>>,
}

impl MemoryLocalCatalog {
    pub fn insert(&self, kind: MappingKind, entity: LocalEntity) {
        self.entities.write().entry(kind).or_default().push(entity);
    }
}

#[async_trait]
impl LocalCatalog for MemoryLocalCatalog {
    async fn list_entities(&self, kind: MappingKind) -> Result<Vec<LocalEntity>> {
        Ok(self.entities.read().get(&kind).cloned().unwrap_or_default())
    }
}

/// Notifier that surfaces permanent failures in the log stream.
#[derive(Default)]
pub struct TracingNotifier;

#[async_trait]
impl SyncNotifier for TracingNotifier {
    async fn permanent_failure(&self, order_id: u64, reason: &str) {
        error!(order_id, reason, "order permanently failed, operator action required");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ledgersync_domain::ErrorCategory;

    use super::*;

    #[tokio::test]
    async fn sync_states_round_trip_and_list_failures() {
        let repo = MemorySyncStateRepository::default();

        let mut ok = SyncState::new(1);
        ok.record_success(SyncStatus::Draft, Utc::now());
        let mut bad = SyncState::new(2);
        bad.record_failure("boom", ErrorCategory::Network, Utc::now());

        repo.put(&ok).await.unwrap();
        repo.put(&bad).await.unwrap();

        assert_eq!(repo.get(1).await.unwrap().unwrap().status, SyncStatus::Draft);
        let failed = repo.list_failed().await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].order_id, 2);
    }

    #[tokio::test]
    async fn mapping_kinds_are_isolated() {
        let store = MemoryMappingStore::default();
        let mapping = Mapping {
            local_key: "101".into(),
            remote_id: "r-1".into(),
            remote_label: "Widget".into(),
            remote_type: None,
        };

        store.set(MappingKind::Item, &mapping).await.unwrap();
        assert!(store.get(MappingKind::Item, "101").await.unwrap().is_some());
        assert!(store.get(MappingKind::CustomField, "101").await.unwrap().is_none());

        store.remove(MappingKind::Item, "101").await.unwrap();
        assert!(store.get(MappingKind::Item, "101").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_order_is_a_not_found_error() {
        let repo = MemoryOrderRepository::default();
        let err = repo.get_order(404).await.unwrap_err();
        assert!(matches!(err, LedgerSyncError::NotFound(_)));
    }
}
