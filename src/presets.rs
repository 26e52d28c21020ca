use std::fmt;
use std::str::FromStr;

use crate::schema::{ FieldDefinition, IndexSpecification, SimilarityMetric };

pub const DEFAULT_DATABASE: &str = "mercadona";
pub const DEFAULT_COLLECTION: &str = "products";

/// Index layouts used by the product embedding pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// `voyage-3-large` text embeddings stored in `vo_embedding`.
    VoyageText,
    /// `text-embedding-ada-002` text embeddings stored in `embedding`.
    OpenAiText,
    /// `voyage-multimodal-3` image embeddings stored in `vo_img_embedding`.
    VoyageImage,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::VoyageText, Preset::OpenAiText, Preset::VoyageImage];

    pub fn index_name(self) -> &'static str {
        match self {
            Preset::VoyageText => "vo_vector_index",
            Preset::OpenAiText => "vector_index",
            Preset::VoyageImage => "vo_image_index",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Preset::VoyageText => "vo_embedding",
            Preset::OpenAiText => "embedding",
            Preset::VoyageImage => "vo_img_embedding",
        }
    }

    pub fn dimensions(self) -> u32 {
        match self {
            Preset::VoyageText | Preset::VoyageImage => 1024,
            Preset::OpenAiText => 1536,
        }
    }

    pub fn specification(self) -> IndexSpecification {
        IndexSpecification::vector_search(self.index_name()).with_field(
            FieldDefinition::vector(self.path(), self.dimensions(), SimilarityMetric::Cosine)
        )
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset::VoyageText
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Preset::VoyageText => "voyage-text",
            Preset::OpenAiText => "openai-text",
            Preset::VoyageImage => "voyage-image",
        };
        f.write_str(label)
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "voyage-text" | "voyage" | "vo_vector_index" => Ok(Preset::VoyageText),
            "openai-text" | "openai" | "vector_index" => Ok(Preset::OpenAiText),
            "voyage-image" | "image" | "vo_image_index" => Ok(Preset::VoyageImage),
            _ => Err(format!("Unknown preset '{}'. Use voyage-text, openai-text or voyage-image.", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_matches_products_index() {
        let spec = Preset::default().specification();
        assert_eq!(spec.name, "vo_vector_index");
        assert_eq!(
            spec.definition.fields,
            vec![FieldDefinition::vector("vo_embedding", 1024, SimilarityMetric::Cosine)]
        );
    }

    #[test]
    fn every_preset_is_valid_and_distinct() {
        let mut names = Vec::new();
        for preset in Preset::ALL {
            preset.specification().validate().unwrap();
            assert_eq!(preset.to_string().parse::<Preset>().unwrap(), preset);
            names.push(preset.index_name());
        }
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Preset::ALL.len());
    }

    #[test]
    fn lookup_by_index_name() {
        assert_eq!("vector_index".parse::<Preset>().unwrap(), Preset::OpenAiText);
        assert_eq!(Preset::OpenAiText.dimensions(), 1536);
        assert!("clip".parse::<Preset>().is_err());
    }
}
