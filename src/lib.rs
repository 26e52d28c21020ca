pub mod config;
pub mod db;
pub mod definition;
pub mod error;
pub mod presets;
pub mod provisioner;
pub mod schema;
pub use config::ProvisionerConfig;
pub use db::{ SearchIndexStore, SearchIndexStatus, create_index_store, get_store_type, StoreType };
pub use error::ProvisionError;
pub use provisioner::Provisioner;
pub use schema::{ IndexSpecification, FieldDefinition, SimilarityMetric, IndexKind };
