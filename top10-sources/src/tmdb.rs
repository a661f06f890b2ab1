//! TMDB identity lookup
//!
//! Best effort: a title that cannot be looked up comes back unresolved and
//! the catalog falls back to a synthetic id. Lookups never fail a run.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use top10_core::{EntityKind, ResolvedEntity};

use crate::error::SourceError;
use crate::types::{TmdbSearchResponse, TmdbSearchResult};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "nl-NL";

/// Maps a title to its identity in an external catalog
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a title, trying `expected` before the alternate kind
    async fn resolve(&self, title: &str, expected: EntityKind) -> ResolvedEntity;
}

/// TMDB search client
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    language: String,
}

impl TmdbClient {
    /// Create a client; without an API key every lookup is unresolved
    pub fn new(api_key: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// First search hit for a title of one kind
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        title: &str,
        kind: EntityKind,
    ) -> Result<Option<TmdbSearchResult>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::LookupUnavailable("no API key configured".to_string()))?;

        let response = self
            .client
            .get(format!("{}/search/{}", self.base_url, kind.as_str()))
            .query(&[
                ("api_key", api_key),
                ("query", title),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::LookupUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::LookupUnavailable(format!(
                "HTTP status {}",
                status.as_u16()
            )));
        }

        let body: TmdbSearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::LookupUnavailable(format!("invalid response: {}", e)))?;

        Ok(body.results.into_iter().next())
    }
}

#[async_trait]
impl IdentityResolver for TmdbClient {
    async fn resolve(&self, title: &str, expected: EntityKind) -> ResolvedEntity {
        if !self.is_configured() {
            debug!("Skipping lookup for '{}': no API key configured", title);
            return ResolvedEntity::unresolved();
        }

        for kind in expected.lookup_order() {
            match self.search(title, kind).await {
                Ok(Some(hit)) => {
                    debug!(
                        "Resolved '{}' as {} {} ({})",
                        title,
                        kind,
                        hit.id,
                        hit.name.as_deref().unwrap_or("?")
                    );
                    return ResolvedEntity::resolved(kind, hit.id.to_string(), hit.poster_path);
                }
                Ok(None) => debug!("No {} match for '{}'", kind, title),
                // An unavailable service will not answer the alternate kind either
                Err(e) => {
                    warn!("Lookup for '{}' failed: {}", title, e);
                    return ResolvedEntity::unresolved();
                }
            }
        }

        ResolvedEntity::unresolved()
    }
}
