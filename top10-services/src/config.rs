//! Pipeline configuration from the environment

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use top10_core::{ContentType, EntityKind, Manifest, RawSource, MAX_RANKED_TITLES};
use top10_sources::extract::DEFAULT_SECTION_KEYWORDS;
use top10_sources::fetcher::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use top10_sources::tmdb::{DEFAULT_BASE_URL, DEFAULT_LANGUAGE};

const DEFAULT_TABULAR_URLS: &[&str] = &[
    "https://www.netflix.com/tudum/top10/data/all-weeks-countries.tsv",
    "https://top10.netflix.com/data/AllWeeklyTop10ByCountry.csv",
    "https://top10.netflix.com/data/AllWeeklyTop10.csv",
];

const DEFAULT_REFERER: &str = "https://top10.netflix.com/";

const DEFAULT_HTML_URLS: &[&str] = &["https://www.netflix.com/tudum/top10/netherlands/tv"];

/// Identity of the published catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub content_type: ContentType,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            id: "netflix-top10-nl".to_string(),
            name: "NETFLIX TOP 10 (NL) – Series".to_string(),
            description: "Weekly Netflix Top 10 series for the Netherlands".to_string(),
            version: "1.2.0".to_string(),
            content_type: ContentType::Series,
        }
    }
}

impl CatalogSettings {
    pub fn manifest(&self) -> Manifest {
        Manifest::single_catalog(
            &self.id,
            &self.version,
            &self.name,
            &self.description,
            self.content_type,
        )
    }

    /// Entity kind looked up first for this catalog's titles
    pub fn expected_kind(&self) -> EntityKind {
        match self.content_type {
            ContentType::Series => EntityKind::Tv,
            ContentType::Movie => EntityKind::Movie,
        }
    }
}

/// Everything a refresh run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Exact region value in the tabular feed
    pub region: String,
    /// Category token, matched case-insensitively
    pub category: String,
    /// Number of ranked titles (1..=10)
    pub limit: usize,
    /// Direct tabular endpoints, in priority order
    pub tabular_urls: Vec<String>,
    /// Tabular mirrors, tried after the direct endpoint of equal priority
    pub mirror_urls: Vec<String>,
    /// HTML pages used when every tabular source fails
    pub html_urls: Vec<String>,
    /// Keywords the ranking section heading must contain
    pub section_keywords: Vec<String>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub tmdb_language: String,
    pub user_agent: String,
    /// `Referer` sent to tabular sources
    pub referer: Option<String>,
    pub timeout_secs: u64,
    /// Location of the JSON artifact
    pub cache_path: PathBuf,
    /// How long the API serves a loaded artifact before re-reading it
    pub cache_ttl_secs: u64,
    pub catalog: CatalogSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region: "Netherlands".to_string(),
            category: "TV".to_string(),
            limit: MAX_RANKED_TITLES,
            tabular_urls: to_strings(DEFAULT_TABULAR_URLS),
            mirror_urls: Vec::new(),
            html_urls: to_strings(DEFAULT_HTML_URLS),
            section_keywords: to_strings(DEFAULT_SECTION_KEYWORDS),
            tmdb_api_key: None,
            tmdb_base_url: DEFAULT_BASE_URL.to_string(),
            tmdb_language: DEFAULT_LANGUAGE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: Some(DEFAULT_REFERER.to_string()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_path: PathBuf::from("cache/netflix_nl_series.json"),
            cache_ttl_secs: 300,
            catalog: CatalogSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults. See `from_lookup` for the list.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    ///
    /// Reads `TOP10_REGION`, `TOP10_CATEGORY`, `TOP10_LIMIT`,
    /// `TOP10_TABULAR_URLS`, `TOP10_MIRROR_URLS`, `TOP10_HTML_URLS`,
    /// `TOP10_SECTION_KEYWORDS`, `TMDB_API_KEY`, `TMDB_BASE_URL`,
    /// `TMDB_LANGUAGE`, `TOP10_USER_AGENT`, `TOP10_REFERER`,
    /// `TOP10_TIMEOUT_SECS`, `TOP10_CACHE_PATH`, `TOP10_CACHE_TTL_SECS`,
    /// `TOP10_CATALOG_ID`, `TOP10_CATALOG_NAME` and `TOP10_CONTENT_TYPE`.
    /// `TOP10_REFERER=none` sends no `Referer` at all.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(region) = get("TOP10_REGION") {
            config.region = region;
        }
        if let Some(category) = get("TOP10_CATEGORY") {
            config.category = category;
        }
        if let Some(limit) = get("TOP10_LIMIT") {
            let parsed: usize = parse_value("TOP10_LIMIT", &limit)?;
            config.limit = parsed.clamp(1, MAX_RANKED_TITLES);
        }
        if let Some(urls) = get("TOP10_TABULAR_URLS") {
            config.tabular_urls = split_list(&urls);
        }
        if let Some(urls) = get("TOP10_MIRROR_URLS") {
            config.mirror_urls = split_list(&urls);
        }
        if let Some(urls) = get("TOP10_HTML_URLS") {
            config.html_urls = split_list(&urls);
        }
        if let Some(keywords) = get("TOP10_SECTION_KEYWORDS") {
            config.section_keywords = split_list(&keywords);
        }

        config.tmdb_api_key = get("TMDB_API_KEY");
        if let Some(base_url) = get("TMDB_BASE_URL") {
            config.tmdb_base_url = base_url;
        }
        if let Some(language) = get("TMDB_LANGUAGE") {
            config.tmdb_language = language;
        }
        if let Some(user_agent) = get("TOP10_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(referer) = get("TOP10_REFERER") {
            config.referer = (!referer.eq_ignore_ascii_case("none")).then_some(referer);
        }
        if let Some(timeout) = get("TOP10_TIMEOUT_SECS") {
            config.timeout_secs = parse_value("TOP10_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(path) = get("TOP10_CACHE_PATH") {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(ttl) = get("TOP10_CACHE_TTL_SECS") {
            let secs: u64 = parse_value("TOP10_CACHE_TTL_SECS", &ttl)?;
            if ttl_delta(secs).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "TOP10_CACHE_TTL_SECS".to_string(),
                    value: ttl,
                });
            }
            config.cache_ttl_secs = secs;
        }

        if let Some(id) = get("TOP10_CATALOG_ID") {
            config.catalog.id = id;
        }
        if let Some(name) = get("TOP10_CATALOG_NAME") {
            config.catalog.name = name;
        }
        if let Some(content_type) = get("TOP10_CONTENT_TYPE") {
            config.catalog.content_type = parse_value("TOP10_CONTENT_TYPE", &content_type)?;
        }

        if config.tabular_urls.is_empty()
            && config.mirror_urls.is_empty()
            && config.html_urls.is_empty()
        {
            return Err(ConfigError::NoSources);
        }

        Ok(config)
    }

    /// Tabular sources: direct endpoints and mirrors share priorities by position
    pub fn tabular_sources(&self) -> Vec<RawSource> {
        let direct = self
            .tabular_urls
            .iter()
            .enumerate()
            .map(|(i, url)| RawSource::tabular(&format!("tabular-{}", i + 1), url, i as u32));
        let mirrors = self
            .mirror_urls
            .iter()
            .enumerate()
            .map(|(i, url)| RawSource::tabular(&format!("mirror-{}", i + 1), url, i as u32).mirror());
        direct
            .chain(mirrors)
            .map(|source| match &self.referer {
                Some(referer) => source.with_referer(referer),
                None => source,
            })
            .collect()
    }

    pub fn html_sources(&self) -> Vec<RawSource> {
        self.html_urls
            .iter()
            .enumerate()
            .map(|(i, url)| RawSource::html(&format!("page-{}", i + 1), url, i as u32))
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        ttl_delta(self.cache_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }
}

fn ttl_delta(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },

    #[error("No tabular, mirror or HTML source URLs configured")]
    NoSources,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.region, "Netherlands");
        assert_eq!(config.category, "TV");
        assert_eq!(config.limit, 10);
        assert_eq!(config.section_keywords, vec!["top 10", "tv"]);
        assert!(config.tmdb_api_key.is_none());
        assert_eq!(config.cache_path, PathBuf::from("cache/netflix_nl_series.json"));
        assert_eq!(config.catalog.expected_kind(), EntityKind::Tv);
    }

    #[test]
    fn test_overrides_and_lists() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("TOP10_REGION", "Belgium"),
            ("TOP10_LIMIT", "25"),
            ("TOP10_TABULAR_URLS", "https://a.example/feed.tsv, https://b.example/feed.tsv"),
            ("TOP10_MIRROR_URLS", "https://mirror.example/feed.tsv"),
            ("TMDB_API_KEY", " secret "),
            ("TOP10_CONTENT_TYPE", "movie"),
        ]))
        .unwrap();

        assert_eq!(config.region, "Belgium");
        assert_eq!(config.limit, 10);
        assert_eq!(config.tmdb_api_key.as_deref(), Some("secret"));
        assert_eq!(config.catalog.content_type, ContentType::Movie);

        let sources = top10_core::chain_order(&config.tabular_sources());
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["tabular-1", "mirror-1", "tabular-2"]);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("TOP10_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "TOP10_TIMEOUT_SECS"));
    }

    #[test]
    fn test_out_of_range_ttl_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[(
            "TOP10_CACHE_TTL_SECS",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "TOP10_CACHE_TTL_SECS")
        );

        let config = PipelineConfig::from_lookup(lookup(&[("TOP10_CACHE_TTL_SECS", "600")])).unwrap();
        assert_eq!(config.cache_ttl(), chrono::Duration::seconds(600));
    }

    #[test]
    fn test_referer_applies_to_tabular_sources() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config
            .tabular_sources()
            .iter()
            .all(|s| s.referer.as_deref() == Some("https://top10.netflix.com/")));
        assert!(config.html_sources().iter().all(|s| s.referer.is_none()));

        let config = PipelineConfig::from_lookup(lookup(&[("TOP10_REFERER", "None")])).unwrap();
        assert!(config.tabular_sources().iter().all(|s| s.referer.is_none()));
    }

    #[test]
    fn test_no_sources_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[
            ("TOP10_TABULAR_URLS", ","),
            ("TOP10_HTML_URLS", " , "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoSources));
    }
}
