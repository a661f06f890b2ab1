//! Resolved catalog identities

use serde::{Deserialize, Serialize};

/// Kind of catalog entity, selecting the lookup endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Episodic work
    Tv,
    /// Single work
    Movie,
}

impl EntityKind {
    /// Path segment used by the lookup service and in catalog ids
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tv => "tv",
            EntityKind::Movie => "movie",
        }
    }

    /// The kind tried when the expected kind has no match
    pub fn alternate(&self) -> EntityKind {
        match self {
            EntityKind::Tv => EntityKind::Movie,
            EntityKind::Movie => EntityKind::Tv,
        }
    }

    /// Lookup order: expected kind first, then the alternate
    pub fn lookup_order(&self) -> [EntityKind; 2] {
        [*self, self.alternate()]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a ranked title in the external catalog
///
/// `kind == None` means the title could not be resolved; the assembler then
/// synthesizes a fallback identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub external_id: Option<String>,
    pub kind: Option<EntityKind>,
    /// Artwork path fragment (e.g. `/abc.jpg`)
    pub artwork_ref: Option<String>,
}

impl ResolvedEntity {
    pub fn resolved(kind: EntityKind, external_id: impl Into<String>, artwork_ref: Option<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            kind: Some(kind),
            artwork_ref,
        }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.kind.is_some() && self.external_id.is_some()
    }
}
