//! Plausibility predicates for scraped title candidates
//!
//! Each predicate has its own rejection reason so every rule can be checked
//! in isolation. Predicates run in a fixed order and the first rejection wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest accepted title, in characters
pub const MIN_TITLE_CHARS: usize = 2;

/// Longest accepted title, in characters
pub const MAX_TITLE_CHARS: usize = 140;

/// Navigation and boilerplate words that never form a title
pub const DEFAULT_DENYLIST: &[&str] = &[
    "sign in",
    "log in",
    "netflix",
    "top 10",
    "tv",
    "films",
    "movies",
    "series",
    "english",
    "non-english",
    "menu",
    "help",
    "privacy",
    "cookie",
];

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("word split regex should compile"));

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    PureDigits,
    TooShort,
    TooLong,
    Denylisted(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::PureDigits => f.write_str("pure digits"),
            Rejection::TooShort => write!(f, "shorter than {} characters", MIN_TITLE_CHARS),
            Rejection::TooLong => write!(f, "longer than {} characters", MAX_TITLE_CHARS),
            Rejection::Denylisted(token) => write!(f, "contains denylisted '{}'", token),
        }
    }
}

/// Ordered set of title predicates with a configurable denylist
#[derive(Debug, Clone)]
pub struct TitleFilter {
    /// Denylist entries as space-joined lowercase word sequences
    denylist: Vec<String>,
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

impl TitleFilter {
    pub fn new<'a>(denylist: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            denylist: denylist
                .into_iter()
                .map(word_sequence)
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// First rejection reason for a candidate, if any
    pub fn rejection(&self, candidate: &str) -> Option<Rejection> {
        let candidate = candidate.trim();
        pure_digits(candidate)
            .or_else(|| too_short(candidate))
            .or_else(|| too_long(candidate))
            .or_else(|| self.denylisted(candidate))
    }

    fn denylisted(&self, candidate: &str) -> Option<Rejection> {
        let padded = format!(" {} ", word_sequence(candidate));
        self.denylist
            .iter()
            .find(|entry| padded.contains(&format!(" {} ", entry)))
            .map(|entry| Rejection::Denylisted(entry.clone()))
    }
}

fn pure_digits(candidate: &str) -> Option<Rejection> {
    let digits_only = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '#' || c == '.');
    digits_only.then_some(Rejection::PureDigits)
}

fn too_short(candidate: &str) -> Option<Rejection> {
    (candidate.chars().count() < MIN_TITLE_CHARS).then_some(Rejection::TooShort)
}

fn too_long(candidate: &str) -> Option<Rejection> {
    (candidate.chars().count() > MAX_TITLE_CHARS).then_some(Rejection::TooLong)
}

/// Lowercase words joined by single spaces, punctuation dropped
fn word_sequence(text: &str) -> String {
    NON_WORD
        .split(&text.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_pure_digits() {
        let filter = TitleFilter::default();
        assert_eq!(filter.rejection("2024"), Some(Rejection::PureDigits));
        assert_eq!(filter.rejection("#7"), Some(Rejection::PureDigits));
        assert_eq!(filter.rejection("1. "), Some(Rejection::PureDigits));
    }

    #[test]
    fn test_rejects_too_short() {
        let filter = TitleFilter::default();
        assert_eq!(filter.rejection("X"), Some(Rejection::TooShort));
        assert_eq!(filter.rejection(""), Some(Rejection::TooShort));
        assert_eq!(filter.rejection("Up"), None);
    }

    #[test]
    fn test_rejects_too_long() {
        let filter = TitleFilter::default();
        let long = "a".repeat(MAX_TITLE_CHARS + 1);
        assert_eq!(filter.rejection(&long), Some(Rejection::TooLong));
        assert_eq!(filter.rejection(&"a".repeat(MAX_TITLE_CHARS)), None);
    }

    #[test]
    fn test_rejects_denylisted_words() {
        let filter = TitleFilter::default();
        assert_eq!(
            filter.rejection("Sign In"),
            Some(Rejection::Denylisted("sign in".to_string()))
        );
        assert_eq!(
            filter.rejection("Top 10 TV (English)"),
            Some(Rejection::Denylisted("top 10".to_string()))
        );
        assert_eq!(
            filter.rejection("Only on Netflix"),
            Some(Rejection::Denylisted("netflix".to_string()))
        );
    }

    #[test]
    fn test_denylist_matches_whole_words_only() {
        let filter = TitleFilter::default();
        // "tv" and "help" inside longer words are not tokens
        assert_eq!(filter.rejection("Patvoort"), None);
        assert_eq!(filter.rejection("Helpsters"), None);
        assert_eq!(filter.rejection("Wednesday"), None);
    }

    #[test]
    fn test_custom_denylist() {
        let filter = TitleFilter::new(["Kijk nu"]);
        assert_eq!(
            filter.rejection("Kijk nu!"),
            Some(Rejection::Denylisted("kijk nu".to_string()))
        );
        assert_eq!(filter.rejection("Sign In"), None);
    }
}
