//! Title normalization, deduplication and ranking
//!
//! Applied to every extracted title regardless of the source that produced
//! it, so deduplication behaves the same across the chain.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use top10_core::{RankedTitle, Ranking};

/// Trailing qualifier rules, applied in this order
static RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "bracket annotation",
            Regex::new(r"\s*[\(\[\{][^\(\)\[\]\{\}]*[\)\]\}]\s*$")
                .expect("bracket regex should compile"),
        ),
        (
            "season marker",
            Regex::new(
                r"(?i)\s*[:\-–—,]?\s*\b(?:season|seizoen|staffel|temporada|saison)\s+(?:\d+|[ivx]+)\b.*$",
            )
            .expect("season regex should compile"),
        ),
        (
            "part marker",
            Regex::new(
                r"(?i)\s*[:\-–—]\s*(?:part|deel|volume|vol\.|book|chapter)\s+(?:\d+|[ivx]+|one|two|three|four|five|six)\b.*$",
            )
            .expect("part regex should compile"),
        ),
        (
            "limited series marker",
            Regex::new(
                r"(?i)\s*[:\-–—]?\s*\b(?:limited series|miniseries|mini-series|docuseries)\s*$",
            )
            .expect("limited series regex should compile"),
        ),
    ]
});

/// Punctuation trimmed from both ends of a title
const EDGE_NOISE: &[char] = &[
    '-', '–', '—', ':', '|', '·', '•', ',', ';', '"', '“', '”', '„', '*', '#', '_', '/',
];

/// Clean a title: strip trailing qualifiers and surrounding noise
///
/// Rules are re-applied until nothing changes, so the result is a fixed
/// point and `normalize(normalize(x)) == normalize(x)`. A rule that would
/// erase the whole title is skipped.
pub fn normalize(title: &str) -> String {
    let mut current = clean_edges(title);

    loop {
        let next = clean_edges(&apply_rules(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_rules(title: &str) -> String {
    let mut out = title.to_string();
    for (_, rule) in RULES.iter() {
        let stripped = rule.replace(&out, "");
        if !clean_edges(&stripped).is_empty() {
            out = stripped.into_owned();
        }
    }
    out
}

fn clean_edges(title: &str) -> String {
    title
        .trim_matches(|c: char| c.is_whitespace() || EDGE_NOISE.contains(&c))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive deduplication, keeping the first occurrence in order
pub fn dedupe_titles<I>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Normalize, drop empties, dedupe, cap to `limit` and number from 1
pub fn rank_titles<I>(titles: I, origin: &str, limit: usize) -> Vec<RankedTitle>
where
    I: IntoIterator<Item = String>,
{
    let normalized = titles
        .into_iter()
        .map(|t| normalize(&t))
        .filter(|t| !t.is_empty());

    dedupe_titles(normalized)
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, title)| RankedTitle::new(i as u32 + 1, title, origin))
        .collect()
}

/// Produce a new ranking with normalized, deduplicated, contiguous titles
pub fn normalize_ranking(ranking: &Ranking, limit: usize) -> Ranking {
    let titles = rank_titles(
        ranking.titles.iter().map(|t| t.title.clone()),
        &ranking.origin,
        limit,
    );
    Ranking::new(ranking.origin.clone(), titles).with_period(ranking.period.clone())
}
