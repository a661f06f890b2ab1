//! Catalog records and the manifest served next to them

use serde::{Deserialize, Serialize};

/// Content type of a catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Series,
    Movie,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Series => "series",
            ContentType::Movie => "movie",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "series" | "tv" => Ok(ContentType::Series),
            "movie" | "film" => Ok(ContentType::Movie),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// The output unit consumed by the serving layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    /// Absolute artwork URL, serialized as `null` when unknown
    pub poster: Option<String>,
    pub description: String,
}

/// The artifact: one JSON document holding the ordered records
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub metas: Vec<CatalogRecord>,
}

impl CatalogDocument {
    pub fn new(metas: Vec<CatalogRecord>) -> Self {
        Self { metas }
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

/// One catalog entry of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: String,
    pub name: String,
}

/// Add-on manifest describing the published catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<ContentType>,
    pub catalogs: Vec<ManifestCatalog>,
}

impl Manifest {
    /// Manifest publishing a single catalog
    pub fn single_catalog(
        catalog_id: &str,
        version: &str,
        name: &str,
        description: &str,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: catalog_id.to_string(),
            version: version.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            resources: vec!["catalog".to_string()],
            types: vec![content_type],
            catalogs: vec![ManifestCatalog {
                content_type,
                id: catalog_id.to_string(),
                name: name.to_string(),
            }],
        }
    }
}
