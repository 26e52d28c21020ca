use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{ sleep, Instant };
use log::{ info, debug, error };

use crate::config::validate_target;
use crate::db::{ SearchIndexStatus, SearchIndexStore };
use crate::error::ProvisionError;
use crate::schema::{ confirmation_message, IndexSpecification };

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Submits index specifications to a store and reports the outcome.
#[derive(Clone)]
pub struct Provisioner {
    store: Arc<dyn SearchIndexStore>,
}

impl Provisioner {
    pub fn new(store: Arc<dyn SearchIndexStore>) -> Self {
        Self { store }
    }

    /// Validates locally, then issues exactly one create request.
    ///
    /// Nothing is retried: a rejection or connectivity fault comes back as
    /// [`ProvisionError::RemoteOperation`].
    pub async fn provision(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpecification
    ) -> Result<String, ProvisionError> {
        validate_target(database, collection)?;
        spec.validate()?;
        info!(
            "Creating {} index '{}' on {}.{} (vector paths: {:?})",
            spec.kind,
            spec.name,
            database,
            collection,
            spec.vector_paths()
        );

        match self.store.create_search_index(database, collection, spec).await {
            Ok(name) => Ok(name),
            Err(e) => {
                error!("Failed to create search index '{}': {}", spec.name, e);
                Err(e)
            }
        }
    }

    /// Provisions and writes the confirmation line to `out` on success only.
    pub async fn provision_and_confirm<W: Write>(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpecification,
        out: &mut W
    ) -> Result<String, ProvisionError> {
        let name = self.provision(database, collection, spec).await?;
        writeln!(out, "{}", confirmation_message(&name))?;
        Ok(name)
    }

    /// Polls the index listing until `name` reports queryable.
    pub async fn wait_until_queryable(
        &self,
        database: &str,
        collection: &str,
        name: &str,
        timeout: Duration,
        poll_interval: Duration
    ) -> Result<SearchIndexStatus, ProvisionError> {
        let started = Instant::now();
        loop {
            let listed = self.store.list_search_indexes(database, collection, Some(name)).await?;
            match listed.into_iter().find(|s| s.name == name) {
                Some(status) if status.queryable => {
                    info!("Search index '{}' is queryable after {:?}", name, started.elapsed());
                    return Ok(status);
                }
                Some(status) if status.has_failed() => {
                    return Err(ProvisionError::remote(format!("search index '{}' failed to build", name)));
                }
                Some(status) => {
                    debug!("Search index '{}' status: {:?}", name, status.status);
                }
                None => {
                    debug!("Search index '{}' not listed yet", name);
                }
            }

            if started.elapsed() + poll_interval > timeout {
                return Err(ProvisionError::Timeout {
                    name: name.to_string(),
                    waited: started.elapsed(),
                });
            }
            sleep(poll_interval).await;
        }
    }

    pub async fn list(
        &self,
        database: &str,
        collection: &str,
        name: Option<&str>
    ) -> Result<Vec<SearchIndexStatus>, ProvisionError> {
        validate_target(database, collection)?;
        self.store.list_search_indexes(database, collection, name).await
    }

    pub async fn drop_index(
        &self,
        database: &str,
        collection: &str,
        name: &str
    ) -> Result<(), ProvisionError> {
        validate_target(database, collection)?;
        if name.trim().is_empty() {
            return Err(ProvisionError::InvalidSpecification("index name must not be empty".to_string()));
        }
        self.store.drop_search_index(database, collection, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryIndexStore;
    use crate::presets::Preset;

    #[tokio::test]
    async fn invalid_specs_never_reach_the_store() {
        let store = Arc::new(MemoryIndexStore::new());
        let provisioner = Provisioner::new(store.clone());
        let spec = IndexSpecification::vector_search("no_fields");

        let err = provisioner.provision("mercadona", "products", &spec).await.unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidSpecification(_)));
        assert!(store.list_search_indexes("mercadona", "products", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_collection_is_rejected() {
        let provisioner = Provisioner::new(Arc::new(MemoryIndexStore::new()));
        let err = provisioner
            .provision("mercadona", "", &Preset::VoyageText.specification()).await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidTarget(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_build_to_finish() {
        let provisioner = Provisioner::new(Arc::new(MemoryIndexStore::with_build_polls(3)));
        let spec = Preset::VoyageImage.specification();
        provisioner.provision("mercadona", "products", &spec).await.unwrap();

        let status = provisioner
            .wait_until_queryable(
                "mercadona",
                "products",
                "vo_image_index",
                Duration::from_secs(60),
                Duration::from_secs(1)
            ).await
            .unwrap();
        assert!(status.queryable);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out() {
        let provisioner = Provisioner::new(Arc::new(MemoryIndexStore::with_build_polls(100)));
        provisioner
            .provision("mercadona", "products", &Preset::VoyageText.specification()).await
            .unwrap();

        let err = provisioner
            .wait_until_queryable(
                "mercadona",
                "products",
                "vo_vector_index",
                Duration::from_secs(3),
                Duration::from_secs(1)
            ).await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_build_is_reported() {
        let store = Arc::new(MemoryIndexStore::with_build_polls(5));
        let provisioner = Provisioner::new(store.clone());
        provisioner
            .provision("mercadona", "products", &Preset::OpenAiText.specification()).await
            .unwrap();
        assert!(store.mark_failed("mercadona", "products", "vector_index").await);

        let err = provisioner
            .wait_until_queryable(
                "mercadona",
                "products",
                "vector_index",
                Duration::from_secs(30),
                Duration::from_secs(1)
            ).await
            .unwrap_err();
        assert!(err.is_remote());
    }
}
