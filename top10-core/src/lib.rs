//! Core types for the weekly Top 10 catalog
//!
//! This crate defines the shared data structures used across the catalog
//! builder, including source definitions, ranked titles, resolved identities
//! and the catalog records written to the output artifact.

pub mod catalog;
pub mod entity;
pub mod error;
pub mod source;
pub mod title;

pub use catalog::{CatalogDocument, CatalogRecord, ContentType, Manifest, ManifestCatalog};
pub use entity::{EntityKind, ResolvedEntity};
pub use error::{CatalogError, CatalogResult};
pub use source::{chain_order, RawSource, SourceFormat, SourceRole};
pub use title::{RankedTitle, Ranking, MAX_RANKED_TITLES};
