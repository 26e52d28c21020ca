use std::fs;
use std::path::{ Path, PathBuf };
use log::{ info, debug };

use crate::error::ProvisionError;
use crate::presets::Preset;
use crate::schema::{ FieldDefinition, IndexSpecification, SimilarityMetric };

/// Where the specification for a `create` comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSource {
    Preset(Preset),
    File(PathBuf),
    Inline {
        name: String,
        path: String,
        dimensions: u32,
        similarity: SimilarityMetric,
    },
}

impl IndexSource {
    /// Builds the specification and appends a `filter` field per entry of `filters`.
    pub fn resolve(&self, filters: &[String]) -> Result<IndexSpecification, ProvisionError> {
        let mut spec = match self {
            IndexSource::Preset(preset) => preset.specification(),
            IndexSource::File(path) => load_definition_file(path)?,
            IndexSource::Inline { name, path, dimensions, similarity } =>
                IndexSpecification::vector_search(name.clone()).with_field(
                    FieldDefinition::vector(path.clone(), *dimensions, *similarity)
                ),
        };
        for filter in filters {
            spec = spec.with_field(FieldDefinition::filter(filter.clone()));
        }
        debug!("Resolved index specification: {:?}", spec);
        Ok(spec)
    }
}

/// Reads an index document (`{ name, type, definition: { fields } }`) from JSON.
pub fn load_definition_file(path: &Path) -> Result<IndexSpecification, ProvisionError> {
    let wrap = |source: Box<dyn std::error::Error + Send + Sync>| ProvisionError::DefinitionFile {
        path: path.to_path_buf(),
        source,
    };
    let text = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    let spec: IndexSpecification = serde_json::from_str(&text).map_err(|e| wrap(e.into()))?;
    info!("Loaded index definition '{}' from {}", spec.name, path.display());
    Ok(spec)
}
