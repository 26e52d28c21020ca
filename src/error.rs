use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Any rejection or connectivity fault reported by the database.
    #[error("remote operation failed: {message}")]
    RemoteOperation {
        message: String,
    },

    #[error("invalid index specification: {0}")]
    InvalidSpecification(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load index definition from {}: {source}", path.display())]
    DefinitionFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("search index '{name}' was not queryable after {waited:?}")]
    Timeout {
        name: String,
        waited: Duration,
    },
}

impl ProvisionError {
    pub fn remote(message: impl Into<String>) -> Self {
        ProvisionError::RemoteOperation { message: message.into() }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ProvisionError::RemoteOperation { .. })
    }
}

impl From<mongodb::error::Error> for ProvisionError {
    fn from(err: mongodb::error::Error) -> Self {
        ProvisionError::remote(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ProvisionError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ProvisionError::InvalidSpecification(format!("cannot encode definition as BSON: {}", err))
    }
}
