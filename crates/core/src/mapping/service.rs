//! Mapping resolution service.
//!
//! CRUD over the mapping tables plus the two matching strategies:
//! SKU-based auto-mapping (exact, case-insensitive) and relevance
//! ranking for manual candidate pickers. Remote item listings are held
//! in an injected TTL cache, populated on miss and invalidated by an
//! explicit refresh.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ledgersync_common::cache::TtlCache;
use ledgersync_domain::{LocalEntity, Mapping, MappingKind, RemoteItem, Result};
use tracing::{debug, info};

use super::ports::{LocalCatalog, MappingStore};
use crate::sync::ports::AccountingApi;

/// Mapping resolution over a store, the local catalog, and the remote
/// item listing.
pub struct MappingService {
    store: Arc<dyn MappingStore>,
    catalog: Arc<dyn LocalCatalog>,
    api: Arc<dyn AccountingApi>,
    item_cache: TtlCache<(), Vec<RemoteItem>>,
}

impl MappingService {
    #[must_use]
    pub fn new(
        store: Arc<dyn MappingStore>,
        catalog: Arc<dyn LocalCatalog>,
        api: Arc<dyn AccountingApi>,
        item_cache_ttl: Duration,
    ) -> Self {
        Self { store, catalog, api, item_cache: TtlCache::new(item_cache_ttl) }
    }

    /// All mappings of a kind as a local-key -> remote-id map.
    pub async fn get_all(&self, kind: MappingKind) -> Result<HashMap<String, String>> {
        let mappings = self.store.get_all(kind).await?;
        Ok(mappings.into_iter().map(|m| (m.local_key, m.remote_id)).collect())
    }

    /// Create or overwrite a mapping.
    pub async fn set_mapping(&self, kind: MappingKind, mapping: &Mapping) -> Result<()> {
        self.store.set(kind, mapping).await
    }

    /// Remove a mapping.
    pub async fn remove_mapping(&self, kind: MappingKind, local_key: &str) -> Result<()> {
        self.store.remove(kind, local_key).await
    }

    /// Whether a local key has a mapping.
    pub async fn is_mapped(&self, kind: MappingKind, local_key: &str) -> Result<bool> {
        Ok(self.store.get(kind, local_key).await?.is_some())
    }

    /// The remote item catalog, cached between calls.
    pub async fn remote_items(&self) -> Result<Vec<RemoteItem>> {
        if let Some(items) = self.item_cache.get(&()) {
            return Ok(items);
        }

        debug!("remote item cache miss, fetching");
        let items = self.api.list_items().await?;
        self.item_cache.insert((), items.clone());
        Ok(items)
    }

    /// Drop the cached item listing and fetch a fresh one.
    pub async fn refresh_items(&self) -> Result<Vec<RemoteItem>> {
        self.item_cache.invalidate(&());
        self.remote_items().await
    }

    /// Map every unmapped local product whose SKU matches a remote item
    /// SKU exactly (ignoring case). Existing mappings are never
    /// overwritten. Returns the number of newly created mappings.
    pub async fn auto_map_by_sku(&self, remote_items: &[RemoteItem]) -> Result<usize> {
        let entities = self.catalog.list_entities(MappingKind::Item).await?;
        let existing = self.get_all(MappingKind::Item).await?;

        let mut created = 0;
        for entity in entities {
            if entity.sku.is_empty() || existing.contains_key(&entity.key) {
                continue;
            }

            let Some(item) =
                remote_items.iter().find(|i| i.sku.eq_ignore_ascii_case(&entity.sku))
            else {
                continue;
            };

            debug!(local_key = %entity.key, remote_id = %item.id, sku = %entity.sku, "auto-mapped by SKU");
            self.store
                .set(
                    MappingKind::Item,
                    &Mapping {
                        local_key: entity.key.clone(),
                        remote_id: item.id.clone(),
                        remote_label: item.name.clone(),
                        remote_type: None,
                    },
                )
                .await?;
            created += 1;
        }

        info!(created, "auto-map by SKU finished");
        Ok(created)
    }

    /// Order remote items by how likely they are to correspond to a
    /// local entity: exact case-insensitive SKU matches first, then
    /// ascending name edit-distance, alphabetical as the tiebreak.
    ///
    /// This ranking feeds a human-facing candidate picker; auto-mapping
    /// uses only the exact-SKU rule.
    #[must_use]
    pub fn sort_by_relevance(
        &self,
        remote_items: &[RemoteItem],
        local: &LocalEntity,
    ) -> Vec<RemoteItem> {
        let local_name = local.name.to_lowercase();

        let mut ranked: Vec<RemoteItem> = remote_items.to_vec();
        ranked.sort_by_key(|item| {
            let sku_match =
                !local.sku.is_empty() && item.sku.eq_ignore_ascii_case(&local.sku);
            let distance = strsim::levenshtein(&item.name.to_lowercase(), &local_name);
            (!sku_match, distance, item.name.clone())
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ledgersync_domain::{
        ContactDraft, CreditNoteDraft, InvoiceDraft, PaymentDraft, RemoteContact,
        RemoteCreditNote, RemoteInvoice, RemotePayment,
    };
    use tokio::sync::Mutex as TokioMutex;

    use super::*;

    #[derive(Default)]
    struct MockMappingStore {
        mappings: TokioMutex<HashMap<String, Mapping>>,
    }

    #[async_trait]
    impl MappingStore for MockMappingStore {
        async fn get_all(&self, _kind: MappingKind) -> Result<Vec<Mapping>> {
            Ok(self.mappings.lock().await.values().cloned().collect())
        }

        async fn get(&self, _kind: MappingKind, local_key: &str) -> Result<Option<Mapping>> {
            Ok(self.mappings.lock().await.get(local_key).cloned())
        }

        async fn set(&self, _kind: MappingKind, mapping: &Mapping) -> Result<()> {
            self.mappings.lock().await.insert(mapping.local_key.clone(), mapping.clone());
            Ok(())
        }

        async fn remove(&self, _kind: MappingKind, local_key: &str) -> Result<()> {
            self.mappings.lock().await.remove(local_key);
            Ok(())
        }
    }

    struct MockCatalog {
        entities: Vec<LocalEntity>,
    }

    #[async_trait]
    impl LocalCatalog for MockCatalog {
        async fn list_entities(&self, _kind: MappingKind) -> Result<Vec<LocalEntity>> {
            Ok(self.entities.clone())
        }
    }

    struct MockApi {
        items: Vec<RemoteItem>,
        list_calls: TokioMutex<u32>,
    }

    impl MockApi {
        fn new(items: Vec<RemoteItem>) -> Self {
            Self { items, list_calls: TokioMutex::new(0) }
        }
    }

    #[async_trait]
    impl AccountingApi for MockApi {
        async fn find_contact_by_email(&self, _email: &str) -> Result<Option<RemoteContact>> {
            unimplemented!("not used by mapping tests")
        }

        async fn get_contact(&self, _contact_id: &str) -> Result<RemoteContact> {
            unimplemented!("not used by mapping tests")
        }

        async fn create_contact(&self, _draft: &ContactDraft) -> Result<RemoteContact> {
            unimplemented!("not used by mapping tests")
        }

        async fn create_invoice(&self, _draft: &InvoiceDraft) -> Result<RemoteInvoice> {
            unimplemented!("not used by mapping tests")
        }

        async fn submit_invoice(&self, _invoice_id: &str) -> Result<RemoteInvoice> {
            unimplemented!("not used by mapping tests")
        }

        async fn create_payment(&self, _draft: &PaymentDraft) -> Result<RemotePayment> {
            unimplemented!("not used by mapping tests")
        }

        async fn create_credit_note(&self, _draft: &CreditNoteDraft) -> Result<RemoteCreditNote> {
            unimplemented!("not used by mapping tests")
        }

        async fn list_items(&self) -> Result<Vec<RemoteItem>> {
            *self.list_calls.lock().await += 1;
            Ok(self.items.clone())
        }

        async fn test_connection(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn item(id: &str, name: &str, sku: &str) -> RemoteItem {
        RemoteItem { id: id.into(), name: name.into(), sku: sku.into(), rate: None }
    }

    fn entity(key: &str, name: &str, sku: &str) -> LocalEntity {
        LocalEntity { key: key.into(), name: name.into(), sku: sku.into() }
    }

    fn create_service(
        entities: Vec<LocalEntity>,
        items: Vec<RemoteItem>,
    ) -> (Arc<MockMappingStore>, MappingService) {
        let store = Arc::new(MockMappingStore::default());
        let service = MappingService::new(
            store.clone(),
            Arc::new(MockCatalog { entities }),
            Arc::new(MockApi::new(items)),
            Duration::from_secs(300),
        );
        (store, service)
    }

    #[tokio::test]
    async fn auto_map_links_exact_case_insensitive_sku() {
        let (_, service) = create_service(
            vec![entity("101", "Widget", "ABC-1")],
            vec![item("r-1", "Widget Remote", "abc-1"), item("r-2", "Other", "ABC-2")],
        );

        let items = service.remote_items().await.unwrap();
        let created = service.auto_map_by_sku(&items).await.unwrap();
        assert_eq!(created, 1);

        let all = service.get_all(MappingKind::Item).await.unwrap();
        assert_eq!(all.get("101"), Some(&"r-1".to_string()));
    }

    #[tokio::test]
    async fn auto_map_requires_exact_characters() {
        // "ABC-10" must not match "ABC-1".
        let (_, service) = create_service(
            vec![entity("101", "Widget", "ABC-1")],
            vec![item("r-1", "Widget", "ABC-10")],
        );

        let items = service.remote_items().await.unwrap();
        assert_eq!(service.auto_map_by_sku(&items).await.unwrap(), 0);
        assert!(!service.is_mapped(MappingKind::Item, "101").await.unwrap());
    }

    #[tokio::test]
    async fn auto_map_skips_mapped_and_skuless_entities() {
        let (_, service) = create_service(
            vec![entity("101", "Widget", "ABC-1"), entity("102", "No Sku", "")],
            vec![item("r-1", "Widget", "abc-1"), item("r-9", "Other", "")],
        );

        service
            .set_mapping(
                MappingKind::Item,
                &Mapping {
                    local_key: "101".into(),
                    remote_id: "existing".into(),
                    remote_label: "Existing".into(),
                    remote_type: None,
                },
            )
            .await
            .unwrap();

        let items = service.remote_items().await.unwrap();
        assert_eq!(service.auto_map_by_sku(&items).await.unwrap(), 0);

        // The pre-existing mapping survived untouched.
        let all = service.get_all(MappingKind::Item).await.unwrap();
        assert_eq!(all.get("101"), Some(&"existing".to_string()));
    }

    #[tokio::test]
    async fn relevance_ranks_sku_then_edit_distance_then_name() {
        let (_, service) = create_service(vec![], vec![]);
        let local = entity("101", "Blue Widget", "SKU-7");

        let items = vec![
            item("a", "Blue Widget Deluxe", ""),
            item("b", "Blue Widget", ""),
            item("c", "Completely Different Thing", "sku-7"),
            item("d", "Alpha", ""),
            item("e", "Blue Widgets", ""),
        ];

        let ranked = service.sort_by_relevance(&items, &local);
        let ids: Vec<&str> = ranked.iter().map(|i| i.id.as_str()).collect();

        // SKU match wins despite its distant name; then exact name, then
        // one edit away, then the rest by distance.
        assert_eq!(ids[0], "c");
        assert_eq!(ids[1], "b");
        assert_eq!(ids[2], "e");
    }

    #[tokio::test]
    async fn relevance_breaks_distance_ties_alphabetically() {
        let (_, service) = create_service(vec![], vec![]);
        let local = entity("101", "Box", "");

        // "Bax" and "Bix" are both one edit from "Box".
        let items = vec![item("a", "Bix", ""), item("b", "Bax", "")];
        let ranked = service.sort_by_relevance(&items, &local);
        assert_eq!(ranked[0].name, "Bax");
        assert_eq!(ranked[1].name, "Bix");
    }

    #[tokio::test]
    async fn remote_items_are_cached_until_refresh() {
        let api = Arc::new(MockApi::new(vec![item("r-1", "Widget", "abc-1")]));
        let service = MappingService::new(
            Arc::new(MockMappingStore::default()),
            Arc::new(MockCatalog { entities: vec![] }),
            api.clone(),
            Duration::from_secs(300),
        );

        service.remote_items().await.unwrap();
        service.remote_items().await.unwrap();
        assert_eq!(*api.list_calls.lock().await, 1);

        service.refresh_items().await.unwrap();
        assert_eq!(*api.list_calls.lock().await, 2);
    }

    #[tokio::test]
    async fn set_and_remove_mapping_round_trip() {
        let (_, service) = create_service(vec![], vec![]);
        let mapping = Mapping {
            local_key: "101".into(),
            remote_id: "r-1".into(),
            remote_label: "Widget".into(),
            remote_type: Some("inventory".into()),
        };

        service.set_mapping(MappingKind::Item, &mapping).await.unwrap();
        assert!(service.is_mapped(MappingKind::Item, "101").await.unwrap());

        service.remove_mapping(MappingKind::Item, "101").await.unwrap();
        assert!(!service.is_mapped(MappingKind::Item, "101").await.unwrap());
    }
}
