pub mod atlas;
pub mod memory;
use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use log::info;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::schema::IndexSpecification;

/// Snapshot of a search index as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub queryable: bool,
}

impl SearchIndexStatus {
    pub fn has_failed(&self) -> bool {
        self.status.as_deref() == Some("FAILED")
    }
}

/// The collection-management surface the provisioner talks to.
#[async_trait]
pub trait SearchIndexStore: Send + Sync {
    /// Submits one create request and returns the name the server acknowledged.
    async fn create_search_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpecification
    ) -> Result<String, ProvisionError>;

    async fn list_search_indexes(
        &self,
        database: &str,
        collection: &str,
        name: Option<&str>
    ) -> Result<Vec<SearchIndexStatus>, ProvisionError>;

    async fn drop_search_index(
        &self,
        database: &str,
        collection: &str,
        name: &str
    ) -> Result<(), ProvisionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Atlas,
    Memory,
}

pub async fn create_index_store(
    config: &ProvisionerConfig
) -> Result<Arc<dyn SearchIndexStore>, ProvisionError> {
    info!("Creating search index store of type: {:?}", config.store_type);
    match config.store_type {
        StoreType::Atlas => {
            let store = atlas::AtlasIndexStore::new(
                config.require_uri()?,
                config.server_selection_timeout,
                config.app_name.as_deref()
            ).await?;
            Ok(Arc::new(store))
        }
        StoreType::Memory => Ok(Arc::new(memory::MemoryIndexStore::new())),
    }
}

pub fn get_store_type(type_str: &str) -> Result<StoreType, String> {
    match type_str.to_lowercase().as_str() {
        "atlas" | "mongodb" | "mongo" => Ok(StoreType::Atlas),
        "memory" | "mem" => Ok(StoreType::Memory),
        _ => Err(format!("Unsupported index store type: {}", type_str)),
    }
}
