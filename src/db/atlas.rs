use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{ self, Document };
use mongodb::options::{ ClientOptions, ServerApi, ServerApiVersion };
use mongodb::{ Client, Collection, SearchIndexModel, SearchIndexType };
use std::time::Duration;
use log::{ info, debug, warn };

use super::{ SearchIndexStatus, SearchIndexStore };
use crate::error::ProvisionError;
use crate::schema::{ IndexKind, IndexSpecification };

pub struct AtlasIndexStore {
    client: Client,
}

impl AtlasIndexStore {
    pub async fn new(
        uri: &str,
        server_selection_timeout: Duration,
        app_name: Option<&str>
    ) -> Result<Self, ProvisionError> {
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            ProvisionError::Config(format!("invalid connection string: {}", e))
        })?;
        options.server_selection_timeout = Some(server_selection_timeout);
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        if let Some(name) = app_name.filter(|n| !n.is_empty()) {
            options.app_name = Some(name.to_string());
        }

        let hosts = options.hosts
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let client = Client::with_options(options)?;
        info!(
            "MongoDB client configured for {:?} (server selection timeout {:?})",
            hosts,
            server_selection_timeout
        );

        Ok(Self { client })
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection::<Document>(collection)
    }
}

fn driver_index_type(kind: IndexKind) -> SearchIndexType {
    match kind {
        IndexKind::VectorSearch => SearchIndexType::VectorSearch,
        IndexKind::Search => SearchIndexType::Search,
    }
}

#[async_trait]
impl SearchIndexStore for AtlasIndexStore {
    async fn create_search_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpecification
    ) -> Result<String, ProvisionError> {
        let model = SearchIndexModel::builder()
            .definition(spec.definition_document()?)
            .name(Some(spec.name.clone()))
            .index_type(Some(driver_index_type(spec.kind)))
            .build();
        debug!("createSearchIndexes on {}.{}: {:?}", database, collection, model);

        let name = self.collection(database, collection).create_search_index(model).await?;
        info!("Atlas acknowledged search index '{}' on {}.{}", name, database, collection);
        Ok(name)
    }

    async fn list_search_indexes(
        &self,
        database: &str,
        collection: &str,
        name: Option<&str>
    ) -> Result<Vec<SearchIndexStatus>, ProvisionError> {
        let cursor = self.collection(database, collection).list_search_indexes().await?;
        let raw: Vec<Document> = cursor.try_collect().await?;
        debug!("listSearchIndexes on {}.{} returned {} entries", database, collection, raw.len());

        let mut indexes = Vec::with_capacity(raw.len());
        for doc in raw {
            match bson::from_document::<SearchIndexStatus>(doc) {
                Ok(status) => {
                    if name.map_or(true, |n| n == status.name) {
                        indexes.push(status);
                    }
                }
                Err(e) => warn!("Skipping unreadable search index entry: {}", e),
            }
        }
        Ok(indexes)
    }

    async fn drop_search_index(
        &self,
        database: &str,
        collection: &str,
        name: &str
    ) -> Result<(), ProvisionError> {
        self.collection(database, collection).drop_search_index(name).await?;
        info!("Dropped search index '{}' on {}.{}", name, database, collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_index_kinds() {
        assert!(matches!(driver_index_type(IndexKind::VectorSearch), SearchIndexType::VectorSearch));
        assert!(matches!(driver_index_type(IndexKind::Search), SearchIndexType::Search));
    }

    #[tokio::test]
    async fn malformed_uri_is_a_config_error() {
        let result = AtlasIndexStore::new("not-a-uri", Duration::from_millis(100), None).await;
        assert!(matches!(result, Err(ProvisionError::Config(_))));
    }
}
