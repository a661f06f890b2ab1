//! Ranked title data structures

use serde::{Deserialize, Serialize};

/// Upper bound on the size of one ranking
pub const MAX_RANKED_TITLES: usize = 10;

/// A title at a given position of the weekly ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTitle {
    /// 1-based rank
    pub rank: u32,
    /// Normalized title
    pub title: String,
    /// Name of the source that produced it
    pub origin: String,
}

impl RankedTitle {
    pub fn new(rank: u32, title: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            rank,
            title: title.into(),
            origin: origin.into(),
        }
    }
}

/// The ordered result of one successful source
///
/// The order of `titles` is the rank order. After normalization ranks are
/// unique and contiguous from 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ranking {
    pub titles: Vec<RankedTitle>,
    /// Source that produced the ranking
    pub origin: String,
    /// Week/period the ranking belongs to, when the source exposes it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl Ranking {
    pub fn new(origin: impl Into<String>, titles: Vec<RankedTitle>) -> Self {
        Self {
            titles,
            origin: origin.into(),
            period: None,
        }
    }

    pub fn with_period(mut self, period: Option<String>) -> Self {
        self.period = period;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Titles in rank order
    pub fn title_names(&self) -> Vec<&str> {
        self.titles.iter().map(|t| t.title.as_str()).collect()
    }

    /// True when ranks run 1..=n without gaps or duplicates
    pub fn has_contiguous_ranks(&self) -> bool {
        self.titles
            .iter()
            .enumerate()
            .all(|(i, t)| t.rank as usize == i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_ranks() {
        let ranking = Ranking::new(
            "feed",
            vec![RankedTitle::new(1, "A", "feed"), RankedTitle::new(2, "B", "feed")],
        );
        assert!(ranking.has_contiguous_ranks());

        let gapped = Ranking::new(
            "feed",
            vec![RankedTitle::new(1, "A", "feed"), RankedTitle::new(3, "B", "feed")],
        );
        assert!(!gapped.has_contiguous_ranks());
    }
}
