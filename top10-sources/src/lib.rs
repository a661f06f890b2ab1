//! Acquisition clients for the weekly Top 10 catalog
//!
//! This crate provides:
//! - Fetcher: HTTP retrieval with per-source validity checks and a
//!   priority-ordered fallback chain
//! - Tabular parser: delimited feeds (TSV/CSV) with tolerant parsing
//! - HTML extractor: structured data, DOM heuristics and text patterns
//! - Normalizer: title cleanup, deduplication and ranking
//! - TMDB client: best-effort identity and artwork lookup

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod filters;
pub mod normalize;
pub mod tabular;
pub mod tmdb;
pub mod types;

pub use error::{SourceAttempt, SourceError, UnavailableReason};
pub use extract::HtmlExtractor;
pub use fetcher::{Fetcher, SourceChain};
pub use filters::{Rejection, TitleFilter};
pub use normalize::{dedupe_titles, normalize, normalize_ranking, rank_titles};
pub use tabular::{TabularParser, TabularQuery};
pub use tmdb::{IdentityResolver, TmdbClient};
