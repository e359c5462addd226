//! Search text classification.
//!
//! # Invariants
//! - Blank text always means "no filter".
//! - A valid `DD.MM.YYYY` date always selects date search, never substring
//!   search.

use crate::date::CalendarDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Escape character used in generated `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

static SEARCH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("valid search date regex"));

/// Parsed task search filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchQuery {
    /// No filter.
    #[default]
    All,
    /// Tasks scheduled exactly on this date.
    OnDate(CalendarDate),
    /// Substring match on title or comment.
    Text(String),
}

impl SearchQuery {
    /// Classifies raw search text.
    ///
    /// Text shaped like `DD.MM.YYYY` but naming an impossible date (for
    /// example `31.02.2024`) falls back to substring search.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::All;
        }
        if SEARCH_DATE_RE.is_match(trimmed) {
            if let Ok(date) = CalendarDate::parse_search(trimmed) {
                return Self::OnDate(date);
            }
        }
        Self::Text(trimmed.to_string())
    }

    /// Returns the `LIKE` pattern for substring queries.
    pub fn like_pattern(&self) -> Option<String> {
        match self {
            Self::Text(needle) => Some(format!("%{}%", escape_like(needle))),
            _ => None,
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_') || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
