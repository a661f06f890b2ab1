//! Catalog refresh pipeline
//!
//! Tabular sources first, HTML pages only when every tabular source failed.
//! The winning ranking is normalized, each title is resolved in rank order,
//! and the records are assembled into the artifact document.

use thiserror::Error;
use tracing::{info, instrument, warn};

use top10_core::{CatalogDocument, CatalogError, EntityKind, RawSource, Ranking};
use top10_sources::{
    normalize_ranking, Fetcher, HtmlExtractor, IdentityResolver, SourceChain, SourceError,
    TabularParser, TabularQuery, TmdbClient,
};

use crate::assembler::{assemble, AssemblerConfig};
use crate::catalog_store::CatalogStore;
use crate::config::PipelineConfig;

/// Errors that abort a refresh run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Client setup failed: {0}")]
    Setup(String),

    #[error("Source error: {0}")]
    Sources(#[from] SourceError),

    #[error("Store error: {0}")]
    Store(#[from] CatalogError),
}

/// One configured refresh run
pub struct CatalogPipeline {
    fetcher: Fetcher,
    tabular_sources: Vec<RawSource>,
    html_sources: Vec<RawSource>,
    tabular: TabularParser,
    extractor: HtmlExtractor,
    resolver: Box<dyn IdentityResolver>,
    assembler: AssemblerConfig,
    expected_kind: EntityKind,
    limit: usize,
}

impl CatalogPipeline {
    /// Build the pipeline with a TMDB resolver
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let fetcher = Fetcher::new(&config.user_agent, config.timeout())
            .map_err(|e| PipelineError::Setup(e.to_string()))?;

        let resolver = TmdbClient::new(config.tmdb_api_key.clone(), config.timeout())
            .map_err(|e| PipelineError::Setup(e.to_string()))?
            .with_base_url(&config.tmdb_base_url)
            .with_language(&config.tmdb_language);

        if !resolver.is_configured() {
            warn!("TMDB_API_KEY not set, every title will use a fallback id");
        }

        let query = TabularQuery::new(&config.region, &config.category).with_limit(config.limit);
        let extractor = HtmlExtractor::new(config.section_keywords.iter().map(String::as_str))
            .with_limit(config.limit);

        Ok(Self {
            fetcher,
            tabular_sources: config.tabular_sources(),
            html_sources: config.html_sources(),
            tabular: TabularParser::new(query),
            extractor,
            resolver: Box::new(resolver),
            assembler: AssemblerConfig::for_catalog(&config.catalog),
            expected_kind: config.catalog.expected_kind(),
            limit: config.limit,
        })
    }

    /// Replace the identity resolver
    pub fn with_resolver(mut self, resolver: Box<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Acquire, normalize, resolve and assemble the catalog document
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<CatalogDocument, PipelineError> {
        let ranking = self.acquire().await?;
        info!(
            "Using {} titles from {} (period: {})",
            ranking.len(),
            ranking.origin,
            ranking.period.as_deref().unwrap_or("n/a")
        );

        let mut entities = Vec::with_capacity(ranking.len());
        for title in &ranking.titles {
            entities.push(self.resolver.resolve(&title.title, self.expected_kind).await);
        }

        let resolved = entities.iter().filter(|e| e.is_resolved()).count();
        info!("Resolved {}/{} titles", resolved, entities.len());

        Ok(CatalogDocument::new(assemble(&ranking, &entities, &self.assembler)))
    }

    /// Run the pipeline and replace the artifact; a failed run leaves it untouched
    pub async fn refresh(&self, store: &CatalogStore) -> Result<CatalogDocument, PipelineError> {
        let document = self.run().await?;
        store.write(&document)?;
        Ok(document)
    }

    /// Normalized ranking from the first usable source
    async fn acquire(&self) -> Result<Ranking, SourceError> {
        let tabular_error = match SourceChain::new(&self.fetcher, &self.tabular_sources)
            .first_success(|source, body| {
                self.accept(self.tabular.parse(body, &source.name)?)
            })
            .await
        {
            Ok(ranking) => return Ok(ranking),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e,
        };

        warn!("Tabular sources failed ({}), falling back to HTML pages", tabular_error);

        match SourceChain::new(&self.fetcher, &self.html_sources)
            .first_success(|source, body| {
                self.accept(self.extractor.extract(body, &source.name)?)
            })
            .await
        {
            Err(SourceError::Exhausted { attempts, last }) => {
                let mut history = tabular_error.attempts().to_vec();
                // No page was tried, so the last tabular failure is still the last error
                let last = match tabular_error {
                    SourceError::Exhausted {
                        last: tabular_last, ..
                    } if attempts.is_empty() => tabular_last,
                    _ => last,
                };
                history.extend(attempts);
                Err(SourceError::Exhausted {
                    attempts: history,
                    last,
                })
            }
            other => other,
        }
    }

    fn accept(&self, ranking: Ranking) -> Result<Ranking, SourceError> {
        let normalized = normalize_ranking(&ranking, self.limit);
        if normalized.is_empty() {
            return Err(SourceError::format(format!(
                "no titles left after normalizing {}",
                ranking.origin
            )));
        }
        Ok(normalized)
    }
}
