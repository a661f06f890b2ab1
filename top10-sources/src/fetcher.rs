//! HTTP retrieval with per-source validity checks
//!
//! Sources are tried strictly in chain order. A body is only handed on when
//! it is non-empty, not the sentinel `null`, and passes a minimal format
//! check for its expected format. Redirects that leave the source's host are
//! refused.

use std::time::Duration;

use reqwest::redirect::{Attempt, Policy};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use top10_core::{chain_order, RawSource, SourceFormat};

use crate::error::{SourceAttempt, SourceError, UnavailableReason};

/// Default identifying client header
pub const DEFAULT_USER_AGENT: &str = "Top10Catalog/1.0 (+catalog refresh)";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Marker an HTML body must contain when the source does not set one
pub const DEFAULT_HTML_MARKER: &str = "top 10";

const MAX_REDIRECTS: usize = 10;

/// Redirect refused because it leaves the original host
#[derive(Debug)]
struct OffHostRedirect {
    target: String,
}

impl std::fmt::Display for OffHostRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "redirect to {} leaves the expected host", self.target)
    }
}

impl std::error::Error for OffHostRedirect {}

/// HTTP client shared by every source of a run
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with an identifying user agent and a bounded timeout
    pub fn new(user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(Policy::custom(same_host_redirects))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch one source and run its validity checks
    #[instrument(skip(self, source), fields(source = %source.name))]
    pub async fn fetch(&self, source: &RawSource) -> Result<String, SourceError> {
        let url = parse_source_url(source)?;

        debug!("Fetching {}", url);

        let mut request = self.client.get(url);
        if let Some(referer) = &source.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::unavailable(&source.name, classify_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::unavailable(
                &source.name,
                UnavailableReason::Status(status.as_u16()),
            ));
        }

        let body = response.text().await.map_err(|e| {
            SourceError::unavailable(&source.name, UnavailableReason::Network(e.to_string()))
        })?;

        check_body(source, &body).map_err(|reason| SourceError::unavailable(&source.name, reason))?;

        debug!("Fetched {} bytes from {}", body.len(), source.name);
        Ok(body)
    }

    /// Return the first body in chain order that passes its checks
    pub async fn fetch_first(&self, sources: &[RawSource]) -> Result<(RawSource, String), SourceError> {
        SourceChain::new(self, sources)
            .first_success(|source, body| Ok((source.clone(), body.to_string())))
            .await
    }
}

/// Priority-ordered fallback over a set of sources
pub struct SourceChain<'a> {
    fetcher: &'a Fetcher,
    sources: Vec<RawSource>,
}

impl<'a> SourceChain<'a> {
    pub fn new(fetcher: &'a Fetcher, sources: &[RawSource]) -> Self {
        Self {
            fetcher,
            sources: chain_order(sources),
        }
    }

    /// Fetch each source in turn and hand its body to `accept`
    ///
    /// Returns the first accepted value. Failures of a single source (fetch or
    /// accept) advance to the next one; fatal errors abort immediately. When
    /// every source fails the full attempt history is returned.
    pub async fn first_success<T, F>(&self, mut accept: F) -> Result<T, SourceError>
    where
        F: FnMut(&RawSource, &str) -> Result<T, SourceError>,
    {
        let mut attempts = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let outcome = match self.fetcher.fetch(source).await {
                Ok(body) => accept(source, &body),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => {
                    info!(
                        "Source {} succeeded after {} failed attempt(s)",
                        source.name,
                        attempts.len()
                    );
                    return Ok(value);
                }
                Err(e) if e.is_fatal() => {
                    warn!("Aborting source chain at {}: {}", source.name, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Source {} failed: {}", source.name, e);
                    attempts.push(SourceAttempt {
                        source: source.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let last = attempts
            .last()
            .map(|a| a.error.clone())
            .unwrap_or_else(|| "no sources configured".to_string());

        Err(SourceError::Exhausted { attempts, last })
    }
}

fn same_host_redirects(attempt: Attempt) -> reqwest::redirect::Action {
    if attempt.previous().len() >= MAX_REDIRECTS {
        return attempt.error("too many redirects");
    }

    let origin = attempt.previous().first().and_then(|u| u.host_str()).map(bare_host);
    let next = attempt.url().host_str().map(bare_host);

    if origin.is_some() && origin == next {
        attempt.follow()
    } else {
        let target = attempt.url().to_string();
        attempt.error(OffHostRedirect { target })
    }
}

fn bare_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn parse_source_url(source: &RawSource) -> Result<Url, SourceError> {
    let url = Url::parse(&source.url).map_err(|e| SourceError::InvalidSource {
        name: source.name.clone(),
        message: format!("{}: {}", source.url, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::InvalidSource {
            name: source.name.clone(),
            message: format!("unsupported scheme {}", url.scheme()),
        });
    }

    Ok(url)
}

fn classify_request_error(err: &reqwest::Error) -> UnavailableReason {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(e) = cause {
        if let Some(off_host) = e.downcast_ref::<OffHostRedirect>() {
            return UnavailableReason::OffHostRedirect(off_host.target.clone());
        }
        cause = e.source();
    }

    UnavailableReason::Network(err.to_string())
}

/// Run every validity check against a fetched body
pub fn check_body(source: &RawSource, body: &str) -> Result<(), UnavailableReason> {
    check_not_empty(body)?;
    check_not_sentinel(body)?;
    match source.format {
        SourceFormat::Tabular => check_tabular_shape(body),
        SourceFormat::Html => {
            check_html_marker(body, source.marker.as_deref().unwrap_or(DEFAULT_HTML_MARKER))
        }
    }
}

fn check_not_empty(body: &str) -> Result<(), UnavailableReason> {
    if body.trim().is_empty() {
        return Err(UnavailableReason::EmptyBody);
    }
    Ok(())
}

fn check_not_sentinel(body: &str) -> Result<(), UnavailableReason> {
    if body.trim().eq_ignore_ascii_case("null") {
        return Err(UnavailableReason::SentinelBody);
    }
    Ok(())
}

fn check_tabular_shape(body: &str) -> Result<(), UnavailableReason> {
    let first_line = body
        .trim_start_matches('\u{feff}')
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();

    if first_line.contains(['\t', ',', ';']) {
        Ok(())
    } else {
        Err(UnavailableReason::SanityCheck(
            "no delimiter on the first line".to_string(),
        ))
    }
}

fn check_html_marker(body: &str, marker: &str) -> Result<(), UnavailableReason> {
    if body.to_lowercase().contains(&marker.to_lowercase()) {
        Ok(())
    } else {
        Err(UnavailableReason::SanityCheck(format!(
            "marker '{}' not found",
            marker
        )))
    }
}
