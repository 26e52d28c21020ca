use mongodb::bson::{ self, Document };
use serde::{ Deserialize, Serialize };
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ProvisionError;

/// Largest vector length Atlas accepts for a `vector` field.
pub const MAX_DIMENSIONS: u32 = 8192;

/// Category of an Atlas search index, serialized as the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexKind {
    VectorSearch,
    Search,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::VectorSearch => write!(f, "vectorSearch"),
            IndexKind::Search => write!(f, "search"),
        }
    }
}

/// How vector closeness is scored at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimilarityMetric {
    Cosine,
    DotProduct,
    Euclidean,
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::DotProduct => write!(f, "dotProduct"),
            SimilarityMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    /// Accepts the Atlas spelling plus the common aliases other vector stores use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "cosine" | "cosinesimilarity" => Ok(SimilarityMetric::Cosine),
            "dotproduct" | "dot" | "ip" => Ok(SimilarityMetric::DotProduct),
            "euclidean" | "l2" => Ok(SimilarityMetric::Euclidean),
            _ =>
                Err(
                    format!("Unsupported similarity metric '{}'. Use cosine, dotProduct or euclidean.", s)
                ),
        }
    }
}

/// Automatic quantization Atlas can apply to stored vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quantization {
    None,
    Scalar,
    Binary,
}

/// One entry of `definition.fields`, tagged by its `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldDefinition {
    Vector {
        path: String,
        #[serde(rename = "numDimensions")]
        num_dimensions: u32,
        similarity: SimilarityMetric,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantization: Option<Quantization>,
    },
    Filter {
        path: String,
    },
}

impl FieldDefinition {
    pub fn vector(path: impl Into<String>, num_dimensions: u32, similarity: SimilarityMetric) -> Self {
        FieldDefinition::Vector {
            path: path.into(),
            num_dimensions,
            similarity,
            quantization: None,
        }
    }

    pub fn filter(path: impl Into<String>) -> Self {
        FieldDefinition::Filter { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            FieldDefinition::Vector { path, .. } | FieldDefinition::Filter { path } => path,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, FieldDefinition::Vector { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub fields: Vec<FieldDefinition>,
}

/// Declarative description of a search index, in the shape the server expects:
/// `{ name, type, definition: { fields: [...] } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpecification {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
    pub definition: IndexDefinition,
}

impl IndexSpecification {
    pub fn vector_search(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::VectorSearch,
            definition: IndexDefinition::default(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.definition.fields.push(field);
        self
    }

    pub fn validate(&self) -> Result<(), ProvisionError> {
        let invalid = |msg: String| Err(ProvisionError::InvalidSpecification(msg));

        if self.name.trim().is_empty() {
            return invalid("index name must not be empty".to_string());
        }
        if self.definition.fields.is_empty() {
            return invalid(format!("index '{}' declares no fields", self.name));
        }

        let mut seen = HashSet::new();
        for field in &self.definition.fields {
            let path = field.path();
            if path.trim().is_empty() {
                return invalid(format!("index '{}' has a field with an empty path", self.name));
            }
            if path.starts_with('$') {
                return invalid(format!("field path '{}' must not start with '$'", path));
            }
            if !seen.insert(path) {
                return invalid(format!("field path '{}' is declared more than once", path));
            }
            if let FieldDefinition::Vector { num_dimensions, .. } = field {
                if *num_dimensions == 0 || *num_dimensions > MAX_DIMENSIONS {
                    return invalid(
                        format!(
                            "numDimensions for '{}' must be between 1 and {}, got {}",
                            path,
                            MAX_DIMENSIONS,
                            num_dimensions
                        )
                    );
                }
            }
        }

        if self.kind == IndexKind::VectorSearch && !self.definition.fields.iter().any(FieldDefinition::is_vector) {
            return invalid(format!("vectorSearch index '{}' needs at least one vector field", self.name));
        }
        Ok(())
    }

    /// The `definition` sub-document as BSON, ready for the driver.
    pub fn definition_document(&self) -> Result<Document, ProvisionError> {
        Ok(bson::to_document(&self.definition)?)
    }

    pub fn vector_paths(&self) -> Vec<&str> {
        self.definition.fields
            .iter()
            .filter(|f| f.is_vector())
            .map(FieldDefinition::path)
            .collect()
    }
}

/// Line printed once the create request has been acknowledged.
pub fn confirmation_message(name: &str) -> String {
    format!("Search index \"{}\" has been created.", name)
}
