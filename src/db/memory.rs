use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{ AtomicBool, Ordering };
use tokio::sync::RwLock;
use log::{ info, debug, warn };

use super::{ SearchIndexStatus, SearchIndexStore };
use crate::error::ProvisionError;
use crate::schema::IndexSpecification;

struct StoredIndex {
    spec: IndexSpecification,
    status: String,
    polls_until_ready: u32,
}

impl StoredIndex {
    fn snapshot(&self) -> SearchIndexStatus {
        SearchIndexStatus {
            name: self.spec.name.clone(),
            kind: Some(self.spec.kind.to_string()),
            status: Some(self.status.clone()),
            queryable: self.status == "READY",
        }
    }
}

type Namespace = (String, String);

/// In-process stand-in for a cluster's search index catalog.
///
/// Applies the server's acceptance rules: duplicate names and malformed
/// definitions are rejected as remote errors. New indexes start `PENDING`
/// and turn `READY` after `build_polls` listings.
pub struct MemoryIndexStore {
    indexes: RwLock<HashMap<Namespace, Vec<StoredIndex>>>,
    offline: AtomicBool,
    build_polls: u32,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::with_build_polls(0)
    }

    pub fn with_build_polls(build_polls: u32) -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            build_polls,
        }
    }

    /// Simulates losing (or regaining) the connection to the cluster.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn mark_failed(&self, database: &str, collection: &str, name: &str) -> bool {
        let mut indexes = self.indexes.write().await;
        let key = (database.to_string(), collection.to_string());
        match indexes.get_mut(&key).and_then(|v| v.iter_mut().find(|i| i.spec.name == name)) {
            Some(index) => {
                index.status = "FAILED".to_string();
                true
            }
            None => false,
        }
    }

    pub async fn definition(
        &self,
        database: &str,
        collection: &str,
        name: &str
    ) -> Option<IndexSpecification> {
        let indexes = self.indexes.read().await;
        indexes
            .get(&(database.to_string(), collection.to_string()))
            .and_then(|v| v.iter().find(|i| i.spec.name == name))
            .map(|i| i.spec.clone())
    }

    fn ensure_online(&self) -> Result<(), ProvisionError> {
        if self.offline.load(Ordering::SeqCst) {
            warn!("Memory index store is offline");
            return Err(ProvisionError::remote("server selection timed out: no reachable servers"));
        }
        Ok(())
    }
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndexStore for MemoryIndexStore {
    async fn create_search_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpecification
    ) -> Result<String, ProvisionError> {
        self.ensure_online()?;
        spec.validate().map_err(|e| ProvisionError::remote(e.to_string()))?;

        let mut indexes = self.indexes.write().await;
        let entries = indexes.entry((database.to_string(), collection.to_string())).or_default();
        if entries.iter().any(|i| i.spec.name == spec.name) {
            return Err(
                ProvisionError::remote(
                    format!("Duplicate Index: index '{}' already exists on {}.{}", spec.name, database, collection)
                )
            );
        }

        let status = if self.build_polls == 0 { "READY" } else { "PENDING" };
        entries.push(StoredIndex {
            spec: spec.clone(),
            status: status.to_string(),
            polls_until_ready: self.build_polls,
        });
        info!("Memory store created search index '{}' on {}.{}", spec.name, database, collection);
        Ok(spec.name.clone())
    }

    async fn list_search_indexes(
        &self,
        database: &str,
        collection: &str,
        name: Option<&str>
    ) -> Result<Vec<SearchIndexStatus>, ProvisionError> {
        self.ensure_online()?;
        let mut indexes = self.indexes.write().await;
        let Some(entries) = indexes.get_mut(&(database.to_string(), collection.to_string())) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for index in entries.iter_mut() {
            if index.status != "FAILED" && index.status != "READY" {
                index.polls_until_ready = index.polls_until_ready.saturating_sub(1);
                index.status = if index.polls_until_ready == 0 {
                    "READY".to_string()
                } else {
                    "BUILDING".to_string()
                };
            }
            if name.map_or(true, |n| n == index.spec.name) {
                out.push(index.snapshot());
            }
        }
        debug!("Memory store listed {} search indexes on {}.{}", out.len(), database, collection);
        Ok(out)
    }

    async fn drop_search_index(
        &self,
        database: &str,
        collection: &str,
        name: &str
    ) -> Result<(), ProvisionError> {
        self.ensure_online()?;
        let mut indexes = self.indexes.write().await;
        let not_found = || {
            ProvisionError::remote(format!("search index '{}' not found on {}.{}", name, database, collection))
        };
        let entries = indexes
            .get_mut(&(database.to_string(), collection.to_string()))
            .ok_or_else(not_found)?;
        let before = entries.len();
        entries.retain(|i| i.spec.name != name);
        if entries.len() == before {
            return Err(not_found());
        }
        info!("Memory store dropped search index '{}' on {}.{}", name, database, collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ FieldDefinition, SimilarityMetric };

    fn spec(name: &str, dims: u32) -> IndexSpecification {
        IndexSpecification::vector_search(name).with_field(
            FieldDefinition::vector("vo_embedding", dims, SimilarityMetric::Cosine)
        )
    }

    #[tokio::test]
    async fn namespaces_are_independent() {
        let store = MemoryIndexStore::new();
        store.create_search_index("mercadona", "products", &spec("idx", 4)).await.unwrap();
        store.create_search_index("mercadona", "recipes", &spec("idx", 4)).await.unwrap();
        assert_eq!(store.list_search_indexes("mercadona", "products", None).await.unwrap().len(), 1);
        assert_eq!(store.list_search_indexes("other", "products", None).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn zero_dimensions_rejected_by_server() {
        let store = MemoryIndexStore::new();
        let err = store.create_search_index("db", "c", &spec("idx", 0)).await.unwrap_err();
        assert!(err.is_remote());
        assert!(store.definition("db", "c", "idx").await.is_none());
    }

    #[tokio::test]
    async fn builds_progress_with_polls() {
        let store = MemoryIndexStore::with_build_polls(2);
        store.create_search_index("db", "c", &spec("idx", 4)).await.unwrap();

        let first = store.list_search_indexes("db", "c", Some("idx")).await.unwrap();
        assert_eq!(first[0].status.as_deref(), Some("BUILDING"));
        assert!(!first[0].queryable);

        let second = store.list_search_indexes("db", "c", Some("idx")).await.unwrap();
        assert_eq!(second[0].status.as_deref(), Some("READY"));
        assert!(second[0].queryable);
    }

    #[tokio::test]
    async fn drop_missing_index_fails() {
        let store = MemoryIndexStore::new();
        assert!(store.drop_search_index("db", "c", "nope").await.unwrap_err().is_remote());
        store.create_search_index("db", "c", &spec("idx", 4)).await.unwrap();
        store.drop_search_index("db", "c", "idx").await.unwrap();
        assert!(store.list_search_indexes("db", "c", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn drop_from_unknown_namespace_leaves_catalog_untouched() {
        let store = MemoryIndexStore::new();
        assert!(store.drop_search_index("ghost", "c", "idx").await.unwrap_err().is_remote());
        assert!(store.indexes.read().await.is_empty());
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = MemoryIndexStore::new();
        store.set_offline(true);
        assert!(store.create_search_index("db", "c", &spec("idx", 4)).await.unwrap_err().is_remote());
        assert!(store.list_search_indexes("db", "c", None).await.is_err());
        store.set_offline(false);
        assert!(store.definition("db", "c", "idx").await.is_none());
    }
}
