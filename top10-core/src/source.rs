//! Source definitions for the acquisition chain

use serde::{Deserialize, Serialize};

/// Expected body format of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Delimited feed with a header row (TSV/CSV)
    Tabular,
    /// Rendered HTML page
    Html,
}

/// Whether a source is the upstream itself or a mirror/proxy of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Direct,
    Mirror,
}

/// One candidate endpoint, defined at configuration time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSource {
    /// Human-readable name, used as the origin of extracted titles
    pub name: String,
    /// Endpoint URL
    pub url: String,
    /// Expected body format
    pub format: SourceFormat,
    /// Position in the fallback chain (lower runs first)
    pub priority: u32,
    /// Direct endpoints run before mirrors at equal priority
    pub role: SourceRole,
    /// Marker string an HTML body must contain to pass the sanity check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// `Referer` header sent with the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

impl RawSource {
    pub fn tabular(name: &str, url: &str, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format: SourceFormat::Tabular,
            priority,
            role: SourceRole::Direct,
            marker: None,
            referer: None,
        }
    }

    pub fn html(name: &str, url: &str, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format: SourceFormat::Html,
            priority,
            role: SourceRole::Direct,
            marker: None,
            referer: None,
        }
    }

    /// Mark this source as a mirror/proxy endpoint
    pub fn mirror(mut self) -> Self {
        self.role = SourceRole::Mirror;
        self
    }

    /// Set the marker string required in HTML bodies
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = Some(marker.to_string());
        self
    }

    pub fn with_referer(mut self, referer: &str) -> Self {
        self.referer = Some(referer.to_string());
        self
    }

    /// Ordering key of the fallback chain
    pub fn chain_key(&self) -> (u32, SourceRole) {
        (self.priority, self.role)
    }
}

/// Sort sources into chain order without reordering equal keys
pub fn chain_order(sources: &[RawSource]) -> Vec<RawSource> {
    let mut ordered = sources.to_vec();
    ordered.sort_by_key(RawSource::chain_key);
    ordered
}
