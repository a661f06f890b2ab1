//! Delimited feed parser
//!
//! Turns a TSV/CSV body into the current ranked top-N for one region and
//! category. Parsing is tolerant: a strict pass first, then a lenient pass,
//! then a pass that drops the records it cannot read.

use chrono::NaiveDate;
use tracing::{debug, info};

use top10_core::{RankedTitle, Ranking, MAX_RANKED_TITLES};

use crate::error::SourceError;

/// A logical column and the header spellings it may appear under
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub synonyms: &'static [&'static str],
}

pub const REGION: Column = Column {
    name: "region",
    synonyms: &["country_name", "country", "region"],
};

pub const RANK: Column = Column {
    name: "rank",
    synonyms: &["weekly_rank", "rank"],
};

pub const CATEGORY: Column = Column {
    name: "category",
    synonyms: &["category", "type"],
};

pub const TITLE: Column = Column {
    name: "title",
    synonyms: &["show_title", "title", "name"],
};

pub const PERIOD: Column = Column {
    name: "period",
    synonyms: &["week", "period", "week_start"],
};

const PERIOD_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y", "%d.%m.%Y"];

/// Which rows of the feed make up the ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularQuery {
    /// Exact value of the region column
    pub region: String,
    /// Token the category column must contain (case-insensitive)
    pub category: String,
    /// Number of titles to keep
    pub limit: usize,
}

impl TabularQuery {
    pub fn new(region: &str, category: &str) -> Self {
        Self {
            region: region.to_string(),
            category: category.to_string(),
            limit: MAX_RANKED_TITLES,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Comma and semicolon feeds honour quoting in every mode; tab-separated
/// feeds never do, and have stray quotes trimmed from their cells instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    /// Every record must match the header width
    Strict,
    /// Records may carry trailing extra fields, but none may be short
    Lenient,
    /// Unreadable or mis-sized records dropped
    Discarding,
}

const PARSE_MODES: [ParseMode; 3] = [ParseMode::Strict, ParseMode::Lenient, ParseMode::Discarding];

/// Header plus rows of a parsed feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    /// Index of a logical column, matched case-insensitively against its synonyms
    pub fn resolve(&self, column: &Column) -> Result<usize, SourceError> {
        let normalized: Vec<String> = self
            .headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();

        column
            .synonyms
            .iter()
            .find_map(|synonym| normalized.iter().position(|h| h == synonym))
            .ok_or_else(|| SourceError::MissingColumn {
                column: column.name.to_string(),
                available: self.headers.clone(),
            })
    }
}

/// Parser for the tabular feed
#[derive(Debug, Clone)]
pub struct TabularParser {
    query: TabularQuery,
}

impl TabularParser {
    pub fn new(query: TabularQuery) -> Self {
        Self { query }
    }

    /// Parse a feed body into the latest ranked top-N
    pub fn parse(&self, raw: &str, origin: &str) -> Result<Ranking, SourceError> {
        let frame = parse_frame(raw)?;

        let region_idx = frame.resolve(&REGION)?;
        let rank_idx = frame.resolve(&RANK)?;
        let category_idx = frame.resolve(&CATEGORY)?;
        let title_idx = frame.resolve(&TITLE)?;
        let period_idx = frame.resolve(&PERIOD).ok();

        let region = self.query.region.trim();
        let category = self.query.category.to_lowercase();

        let matching: Vec<&Vec<String>> = frame
            .rows
            .iter()
            .filter(|row| cell(row, region_idx).trim() == region)
            .filter(|row| cell(row, category_idx).to_lowercase().contains(&category))
            .collect();

        if matching.is_empty() {
            return Err(SourceError::format(format!(
                "no rows for region '{}' and category '{}' in {}",
                self.query.region, self.query.category, origin
            )));
        }

        let (mut rows, period) = match period_idx {
            Some(idx) => select_latest_period(matching, idx),
            None => (matching, None),
        };

        rows.sort_by_key(|row| match parse_rank(cell(row, rank_idx)) {
            Some(rank) => (0, rank),
            None => (1, 0),
        });
        rows.truncate(self.query.limit);

        let titles: Vec<RankedTitle> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let rank = parse_rank(cell(row, rank_idx)).unwrap_or(i as u32 + 1);
                RankedTitle::new(rank, cell(row, title_idx).trim(), origin)
            })
            .collect();

        info!(
            "Parsed {} ranked titles from {} (period: {})",
            titles.len(),
            origin,
            period.as_deref().unwrap_or("n/a")
        );

        Ok(Ranking::new(origin, titles).with_period(period))
    }
}

/// Try every parse mode in order, returning the first non-empty frame
pub fn parse_frame(raw: &str) -> Result<Frame, SourceError> {
    let body = raw.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(body);

    for mode in PARSE_MODES {
        match read_frame(body, delimiter, mode) {
            Ok(frame) if !frame.rows.is_empty() => {
                debug!(
                    "{:?} parse produced {} rows with {} columns",
                    mode,
                    frame.rows.len(),
                    frame.headers.len()
                );
                return Ok(frame);
            }
            Ok(_) => debug!("{:?} parse produced an empty frame", mode),
            Err(e) => debug!("{:?} parse failed: {}", mode, e),
        }
    }

    Err(SourceError::format(
        "no parse strategy produced a non-empty frame",
    ))
}

fn sniff_delimiter(body: &str) -> u8 {
    let first_line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    if first_line.contains('\t') {
        b'\t'
    } else if first_line.contains(';') && !first_line.contains(',') {
        b';'
    } else {
        b','
    }
}

fn read_frame(body: &str, delimiter: u8, mode: ParseMode) -> Result<Frame, SourceError> {
    let quoted = delimiter != b'\t';
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(mode != ParseMode::Strict)
        .quoting(quoted)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SourceError::format(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let width = headers.len();
    let mut rows = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = match (mode, record) {
            (_, Ok(record)) => record,
            (ParseMode::Discarding, Err(e)) => {
                debug!("Dropping unreadable record: {}", e);
                continue;
            }
            (_, Err(e)) => return Err(SourceError::format(e.to_string())),
        };

        match mode {
            ParseMode::Lenient if record.len() < width => {
                return Err(SourceError::format(format!(
                    "record {} has {} fields (expected at least {})",
                    line + 1,
                    record.len(),
                    width
                )));
            }
            ParseMode::Discarding if record.len() != width => {
                debug!("Dropping record with {} fields (expected {})", record.len(), width);
                continue;
            }
            _ => {}
        }

        let row: Vec<String> = record
            .iter()
            .map(|field| {
                let field = field.trim();
                if quoted {
                    field.to_string()
                } else {
                    field.trim_matches('"').to_string()
                }
            })
            .collect();

        if row.iter().all(|f| f.is_empty()) {
            continue;
        }
        rows.push(row);
    }

    Ok(Frame { headers, rows })
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn parse_rank(value: &str) -> Option<u32> {
    value
        .trim()
        .trim_start_matches('#')
        .parse::<u32>()
        .ok()
        .filter(|rank| *rank > 0)
}

/// Parse a period value as a calendar date
///
/// Accepts zero-padded or unpadded numeric dates and RFC 3339 timestamps.
pub fn parse_period(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    PERIOD_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            value
                .split_once('T')
                .and_then(|(date, _)| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        })
}

/// Keep the rows of the latest period
///
/// Dates compare chronologically; values that do not parse lose against any
/// that do. Only when nothing parses is the lexicographic maximum used.
fn select_latest_period(
    rows: Vec<&Vec<String>>,
    idx: usize,
) -> (Vec<&Vec<String>>, Option<String>) {
    let latest_date = rows.iter().filter_map(|row| parse_period(cell(row, idx))).max();

    let keep: Vec<&Vec<String>> = match latest_date {
        Some(latest) => rows
            .into_iter()
            .filter(|row| parse_period(cell(row, idx)) == Some(latest))
            .collect(),
        None => {
            let latest_raw = rows
                .iter()
                .map(|row| cell(row, idx).trim().to_string())
                .max()
                .unwrap_or_default();
            rows.into_iter()
                .filter(|row| cell(row, idx).trim() == latest_raw)
                .collect()
        }
    };

    let period = keep
        .first()
        .map(|row| cell(row, idx).trim().to_string())
        .filter(|p| !p.is_empty());

    (keep, period)
}
