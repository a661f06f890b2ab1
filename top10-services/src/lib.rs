//! Catalog services for the weekly Top 10 catalog
//!
//! This crate wires the acquisition clients into one refresh pipeline,
//! assembles the resulting catalog records and persists them as the
//! JSON artifact served by the API.

pub mod assembler;
pub mod catalog_store;
pub mod config;
pub mod pipeline;

pub use assembler::{assemble, AssemblerConfig};
pub use catalog_store::{missing_catalog, CachedCatalog, CatalogStore};
pub use config::{CatalogSettings, ConfigError, PipelineConfig};
pub use pipeline::{CatalogPipeline, PipelineError};
