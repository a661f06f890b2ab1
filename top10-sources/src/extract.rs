//! Title extraction from rendered pages
//!
//! Used when no tabular source is usable. Strategies run in a fixed order
//! and the first one that yields a plausible title wins:
//! - embedded JSON (`application/json`, `ld+json`, `__NEXT_DATA__`)
//! - the section under a "Top 10" heading
//! - ranked lines in the page text (`1. Title`, `#2 Title`)

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

use top10_core::{RankedTitle, Ranking, MAX_RANKED_TITLES};

use crate::error::SourceError;
use crate::filters::TitleFilter;

/// Default keywords a section heading must contain
pub const DEFAULT_SECTION_KEYWORDS: &[&str] = &["top 10", "tv"];

static SCRIPTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("script selector should parse"));

static HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4").expect("heading selector should parse"));

static RANKED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?(10|[1-9])(?:\s*[.):\-–—]\s*|\s+)(\S.*)$")
        .expect("ranked line regex should compile")
});

/// Attributes that carry a title on cards and links
const TITLE_ATTRIBUTES: &[&str] = &["aria-label", "data-title", "title"];

type Strategy = fn(&HtmlExtractor, &Html) -> Vec<String>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("structured data", structured_data),
    ("dom heuristics", dom_heuristics),
    ("text pattern", text_pattern),
];

/// Extracts a ranked title list from raw HTML
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    section_keywords: Vec<String>,
    filter: TitleFilter,
    limit: usize,
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SECTION_KEYWORDS.iter().copied())
    }
}

impl HtmlExtractor {
    pub fn new<'a>(section_keywords: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            section_keywords: section_keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            filter: TitleFilter::default(),
            limit: MAX_RANKED_TITLES,
        }
    }

    pub fn with_filter(mut self, filter: TitleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Extract up to `limit` titles, ranked by their order on the page
    pub fn extract(&self, raw_html: &str, origin: &str) -> Result<Ranking, SourceError> {
        let document = Html::parse_document(raw_html);

        for (name, strategy) in STRATEGIES {
            let candidates = strategy(self, &document);
            let found = candidates.len();
            let titles = self.accept(candidates);
            debug!(
                "Strategy '{}' on {}: {} candidates, {} accepted",
                name,
                origin,
                found,
                titles.len()
            );

            if !titles.is_empty() {
                info!("Extracted {} titles from {} via {}", titles.len(), origin, name);
                let ranked = titles
                    .into_iter()
                    .enumerate()
                    .map(|(i, title)| RankedTitle::new(i as u32 + 1, title, origin))
                    .collect();
                return Ok(Ranking::new(origin, ranked));
            }
        }

        Err(SourceError::format(format!(
            "no extraction strategy yielded titles from {}",
            origin
        )))
    }

    /// Filter candidates and dedupe them case-insensitively, keeping page order
    fn accept(&self, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for candidate in candidates {
            let candidate = collapse_whitespace(&candidate);
            if let Some(rejection) = self.filter.rejection(&candidate) {
                debug!("Rejected {:?}: {}", candidate, rejection);
                continue;
            }
            if !seen.insert(candidate.to_lowercase()) {
                continue;
            }
            accepted.push(candidate);
            if accepted.len() >= self.limit {
                break;
            }
        }

        accepted
    }

    fn matches_section(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.section_keywords.iter().all(|k| text.contains(k.as_str()))
    }
}

fn structured_data(_: &HtmlExtractor, document: &Html) -> Vec<String> {
    let mut out = Vec::new();

    for script in document.select(&SCRIPTS) {
        let element = script.value();
        let is_json = element
            .attr("type")
            .map(|t| t.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
            || element.id() == Some("__NEXT_DATA__");
        if !is_json {
            continue;
        }

        let body: String = script.text().collect();
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => collect_title_values(&value, false, &mut out),
            Err(e) => debug!("Skipping unparseable JSON script: {}", e),
        }
    }

    out
}

/// Depth-first walk collecting strings bound to title-like keys
///
/// `name` only counts on the `item` of an `itemListElement` entry, so site
/// names and breadcrumb labels stay out of the ranking.
fn collect_title_values(value: &Value, list_item: bool, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some("BreadcrumbList") {
                return;
            }
            for (key, child) in map {
                let key = key.to_lowercase();
                match child {
                    Value::String(s) if is_title_key(&key) || (list_item && key == "name") => {
                        out.push(s.clone());
                    }
                    Value::Array(entries) if key == "itemlistelement" => {
                        for entry in entries {
                            match entry.get("item") {
                                Some(item) => collect_title_values(item, true, out),
                                None => collect_title_values(entry, false, out),
                            }
                        }
                    }
                    _ => collect_title_values(child, false, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_title_values(item, false, out);
            }
        }
        _ => {}
    }
}

fn is_title_key(key: &str) -> bool {
    key.ends_with("title")
}

fn dom_heuristics(extractor: &HtmlExtractor, document: &Html) -> Vec<String> {
    let Some(heading) = document
        .select(&HEADINGS)
        .find(|h| extractor.matches_section(&element_text(h)))
    else {
        return Vec::new();
    };

    // A heading wrapped on its own is anchored at its wrapper instead
    let anchor = if heading.next_siblings().any(|n| ElementRef::wrap(n).is_some()) {
        heading
    } else {
        heading.parent().and_then(ElementRef::wrap).unwrap_or(heading)
    };

    let mut out = Vec::new();
    for sibling in anchor.next_siblings().filter_map(ElementRef::wrap) {
        if is_heading(&sibling) && !extractor.matches_section(&element_text(&sibling)) {
            break;
        }
        collect_card_titles(sibling, &mut out);
    }
    out
}

fn collect_card_titles(root: ElementRef<'_>, out: &mut Vec<String>) {
    for element in root.descendants().filter_map(ElementRef::wrap) {
        let value = element.value();

        for attr in TITLE_ATTRIBUTES {
            if let Some(v) = value.attr(attr) {
                out.push(v.to_string());
            }
        }
        if value.name() == "img" {
            if let Some(alt) = value.attr("alt") {
                out.push(alt.to_string());
            }
        }

        let title_class = value
            .attr("class")
            .map(|c| c.to_lowercase().contains("title"))
            .unwrap_or(false);
        if title_class || is_heading(&element) {
            out.push(element_text(&element));
        }
    }
}

fn text_pattern(_: &HtmlExtractor, document: &Html) -> Vec<String> {
    let mut out = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| matches!(a.value().name(), "script" | "style" | "noscript"));
        if hidden {
            continue;
        }

        for line in text.lines() {
            if let Some(caps) = RANKED_LINE.captures(line.trim()) {
                out.push(caps[2].to_string());
            }
        }
    }

    out
}

fn is_heading(element: &ElementRef<'_>) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION_PAGE: &str = r#"
        <html><body>
          <nav><a title="Sign In">Sign In</a></nav>
          <section>
            <h2>Top 10 TV in the Netherlands</h2>
            <ul>
              <li><a aria-label="Wednesday"><img alt="Wednesday"></a></li>
              <li><div data-title="Squid Game"></div></li>
              <li><span class="card-title">Adolescence</span></li>
            </ul>
            <h2>Top 10 Films</h2>
            <ul><li><img alt="Some Film"></li></ul>
          </section>
        </body></html>
    "#;

    #[test]
    fn test_structured_data_wins() {
        let html = format!(
            r#"<html><head>
                <script id="__NEXT_DATA__" type="application/json">
                  {{"props": {{"items": [
                    {{"title": "Wednesday", "rank": 1}},
                    {{"showTitle": "Dark"}},
                    {{"name": "Netflix"}}
                  ]}}}}
                </script>
               </head>{}</html>"#,
            SECTION_PAGE
        );

        let ranking = HtmlExtractor::default().extract(&html, "page").unwrap();
        assert_eq!(ranking.title_names(), vec!["Wednesday", "Dark"]);
        assert!(ranking.has_contiguous_ranks());
    }

    #[test]
    fn test_structured_data_ignores_plain_scripts() {
        let html = r#"<html><head>
            <script>var x = {"title": "Not Data"};</script>
            <script type="application/ld+json">{"itemListElement": [{"item": {"name": "Ripley"}}]}</script>
        </head><body></body></html>"#;

        let ranking = HtmlExtractor::default().extract(html, "page").unwrap();
        assert_eq!(ranking.title_names(), vec!["Ripley"]);
    }

    #[test]
    fn test_structured_data_skips_breadcrumb_names() {
        let html = r#"<html><head>
            <script type="application/ld+json">
              {"@type": "BreadcrumbList", "itemListElement": [
                {"@type": "ListItem", "position": 1, "name": "Home", "item": "https://example.com/"},
                {"@type": "ListItem", "position": 2, "name": "Netherlands", "item": {"@id": "/nl", "name": "Netherlands"}}
              ]}
            </script>
            <script type="application/ld+json">
              {"@type": "ItemList", "name": "Top 10 TV", "itemListElement": [
                {"@type": "ListItem", "position": 1, "name": "Home", "item": {"@type": "TVSeries", "name": "Wednesday"}},
                {"@type": "ListItem", "position": 2, "item": {"@type": "TVSeries", "name": "Dark"}}
              ]}
            </script>
            <script type="application/ld+json">{"@type": "Organization", "name": "Streaming Co"}</script>
        </head><body></body></html>"#;

        let ranking = HtmlExtractor::default().extract(html, "page").unwrap();
        assert_eq!(ranking.title_names(), vec!["Wednesday", "Dark"]);
    }

    #[test]
    fn test_dom_heuristic_stops_at_next_section() {
        let ranking = HtmlExtractor::default().extract(SECTION_PAGE, "page").unwrap();
        assert_eq!(
            ranking.title_names(),
            vec!["Wednesday", "Squid Game", "Adolescence"]
        );
        assert_eq!(ranking.titles[0].origin, "page");
    }

    #[test]
    fn test_dom_heuristic_escalates_lone_heading() {
        let html = r#"<html><body><div>
            <div class="header"><h3>Top 10 TV</h3></div>
            <ol><li title="Dark"></li><li title="Ripley"></li></ol>
        </div></body></html>"#;

        let ranking = HtmlExtractor::default().extract(html, "page").unwrap();
        assert_eq!(ranking.title_names(), vec!["Dark", "Ripley"]);
    }

    #[test]
    fn test_text_pattern_fallback() {
        let html = r#"<html><body>
            <p>1. Wednesday</p>
            <p>2) Squid Game</p>
            <p>#3 Dark</p>
            <p>10 - Bridgerton</p>
            <p>2024</p>
            <script>1. Hidden</script>
        </body></html>"#;

        let ranking = HtmlExtractor::default().extract(html, "page").unwrap();
        assert_eq!(
            ranking.title_names(),
            vec!["Wednesday", "Squid Game", "Dark", "Bridgerton"]
        );
    }

    #[test]
    fn test_limit_caps_titles() {
        let ranking = HtmlExtractor::default()
            .with_limit(2)
            .extract(SECTION_PAGE, "page")
            .unwrap();
        assert_eq!(ranking.title_names(), vec!["Wednesday", "Squid Game"]);
    }

    #[test]
    fn test_nothing_found_is_format_error() {
        let err = HtmlExtractor::default()
            .extract("<html><body><p>Nothing to see</p></body></html>", "page")
            .unwrap_err();
        assert!(matches!(err, SourceError::FormatError(_)));
    }
}
