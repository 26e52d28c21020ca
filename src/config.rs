use std::time::Duration;

use crate::db::StoreType;
use crate::error::ProvisionError;
use crate::presets::{ DEFAULT_COLLECTION, DEFAULT_DATABASE };

pub const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone, Debug)]
pub struct ProvisionerConfig {
    pub store_type: StoreType,
    /// Connection string; only the Atlas store needs one.
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
    pub server_selection_timeout: Duration,
    pub app_name: Option<String>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Atlas,
            uri: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            server_selection_timeout: DEFAULT_SERVER_SELECTION_TIMEOUT,
            app_name: Some(env!("CARGO_PKG_NAME").to_string()),
        }
    }
}

impl ProvisionerConfig {
    pub fn memory() -> Self {
        Self {
            store_type: StoreType::Memory,
            ..Self::default()
        }
    }

    /// Returns the URI or a configuration error naming where it is expected.
    pub fn require_uri(&self) -> Result<&str, ProvisionError> {
        self.uri
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ProvisionError::Config(
                    "a connection string is required for the atlas store (--uri or CLUSTER_URI)".to_string()
                )
            })
    }
}

pub fn validate_target(database: &str, collection: &str) -> Result<(), ProvisionError> {
    if database.trim().is_empty() {
        return Err(ProvisionError::InvalidTarget("database name must not be empty".to_string()));
    }
    if collection.trim().is_empty() {
        return Err(ProvisionError::InvalidTarget("collection name must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_products() {
        let config = ProvisionerConfig::default();
        assert_eq!(config.database, "mercadona");
        assert_eq!(config.collection, "products");
        assert_eq!(config.server_selection_timeout, Duration::from_secs(5));
    }

    #[test]
    fn uri_is_required_and_non_blank() {
        let mut config = ProvisionerConfig::default();
        assert!(matches!(config.require_uri(), Err(ProvisionError::Config(_))));
        config.uri = Some("   ".to_string());
        assert!(config.require_uri().is_err());
        config.uri = Some("mongodb+srv://cluster.example.net".to_string());
        assert_eq!(config.require_uri().unwrap(), "mongodb+srv://cluster.example.net");
    }

    #[test]
    fn empty_targets_are_rejected() {
        assert!(validate_target("mercadona", "products").is_ok());
        assert!(matches!(validate_target("", "products"), Err(ProvisionError::InvalidTarget(_))));
        assert!(matches!(validate_target("mercadona", " "), Err(ProvisionError::InvalidTarget(_))));
    }
}
