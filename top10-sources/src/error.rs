//! Error types for the acquisition pipeline

use thiserror::Error;

/// Why a source could not deliver a usable body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Connection, TLS or timeout failure
    Network(String),
    /// Non-2xx response
    Status(u16),
    /// Empty or whitespace-only body
    EmptyBody,
    /// Body is the literal `null`
    SentinelBody,
    /// A redirect tried to leave the source's host
    OffHostRedirect(String),
    /// Body failed the minimal format check
    SanityCheck(String),
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::Network(e) => write!(f, "network failure: {}", e),
            UnavailableReason::Status(code) => write!(f, "HTTP status {}", code),
            UnavailableReason::EmptyBody => f.write_str("empty body"),
            UnavailableReason::SentinelBody => f.write_str("sentinel \"null\" body"),
            UnavailableReason::OffHostRedirect(target) => {
                write!(f, "redirect left the expected host ({})", target)
            }
            UnavailableReason::SanityCheck(what) => write!(f, "sanity check failed: {}", what),
        }
    }
}

/// One failed attempt in a source chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    /// Source name
    pub source: String,
    /// Rendered error
    pub error: String,
}

/// Errors that can occur while acquiring and extracting titles
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network/status/empty-body/off-host-redirect/sanity failure of one source
    #[error("Source {name} unavailable: {reason}")]
    SourceUnavailable {
        /// Source name
        name: String,
        reason: UnavailableReason,
    },

    /// No parser strategy produced a usable frame, or no extraction strategy
    /// yielded any candidate
    #[error("Format error: {0}")]
    FormatError(String),

    /// Tabular schema mismatch
    #[error("Missing column '{column}' (available: {})", .available.join(", "))]
    MissingColumn {
        /// Logical column name
        column: String,
        /// Headers present in the feed
        available: Vec<String>,
    },

    /// Identity lookup not configured or failed
    #[error("Lookup unavailable: {0}")]
    LookupUnavailable(String),

    /// Source definition cannot be used at all (aborts the pipeline)
    #[error("Invalid source {name}: {message}")]
    InvalidSource {
        name: String,
        message: String,
    },

    /// Every configured source failed
    #[error("All {} sources failed, last error: {last}", .attempts.len())]
    Exhausted {
        /// Every failed attempt, in chain order
        attempts: Vec<SourceAttempt>,
        last: String,
    },
}

impl SourceError {
    pub fn unavailable(source: impl Into<String>, reason: UnavailableReason) -> Self {
        SourceError::SourceUnavailable {
            name: source.into(),
            reason,
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        SourceError::FormatError(msg.into())
    }

    /// Fatal errors abort the pipeline instead of advancing to the next source
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::InvalidSource { .. })
    }

    /// Attempt history of an exhausted chain
    pub fn attempts(&self) -> &[SourceAttempt] {
        match self {
            SourceError::Exhausted { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_lists_headers() {
        let err = SourceError::MissingColumn {
            column: "rank".to_string(),
            available: vec!["week".to_string(), "show_title".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'rank'"));
        assert!(msg.contains("week, show_title"));
    }

    #[test]
    fn test_only_invalid_source_is_fatal() {
        assert!(SourceError::InvalidSource {
            name: "feed".to_string(),
            message: "relative URL".to_string(),
        }
        .is_fatal());
        assert!(!SourceError::unavailable("feed", UnavailableReason::SentinelBody).is_fatal());
        assert!(!SourceError::format("no rows").is_fatal());
    }
}
