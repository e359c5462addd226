//! Calendar date value used by tasks and recurrence resolution.
//!
//! # Responsibility
//! - Parse and format the canonical `YYYYMMDD` storage form.
//! - Parse the `DD.MM.YYYY` form accepted by task search.
//!
//! # Invariants
//! - A `CalendarDate` is always a valid Gregorian date with no time or zone.
//! - Ordering is chronological and matches ordering of the canonical string.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// `chrono` format string for the canonical storage form.
pub const DATE_FORMAT: &str = "%Y%m%d";
/// `chrono` format string for search input.
pub const SEARCH_DATE_FORMAT: &str = "%d.%m.%Y";
/// Last year whose dates render as eight digits.
pub const MAX_CANONICAL_YEAR: i32 = 9999;

/// Error returned when a string is not a valid calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub input: String,
    pub expected: &'static str,
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid date `{}`; expected {}",
            self.input, self.expected
        )
    }
}

impl Error for DateParseError {}

/// Naive calendar date, canonically rendered as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Wraps a chrono date only when it renders as `YYYYMMDD`.
    pub fn from_naive_canonical(date: NaiveDate) -> Option<Self> {
        (0..=MAX_CANONICAL_YEAR)
            .contains(&date.year())
            .then_some(Self(date))
    }

    /// Builds a date from year/month/day parts, `None` when the parts are invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::from_naive_canonical)
    }

    /// Current local date with the time of day dropped.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Parses the canonical 8-digit `YYYYMMDD` form.
    ///
    /// Rejects anything that is not exactly eight ASCII digits, so inputs like
    /// `2024011` or `+2024010` never slip through chrono's lenient parser.
    pub fn parse_canonical(value: &str) -> Result<Self, DateParseError> {
        let error = || DateParseError {
            input: value.to_string(),
            expected: "YYYYMMDD",
        };
        if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(error());
        }
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Self)
            .map_err(|_| error())
    }

    /// Parses the `DD.MM.YYYY` form used by date search.
    pub fn parse_search(value: &str) -> Result<Self, DateParseError> {
        NaiveDate::parse_from_str(value, SEARCH_DATE_FORMAT)
            .ok()
            .and_then(Self::from_naive_canonical)
            .ok_or_else(|| DateParseError {
                input: value.to_string(),
                expected: "DD.MM.YYYY",
            })
    }

    /// Returns the underlying chrono date.
    pub fn naive(self) -> NaiveDate {
        self.0
    }

    /// Returns the canonical `YYYYMMDD` string.
    pub fn to_canonical(self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_canonical(s)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_canonical(&raw).map_err(serde::de::Error::custom)
    }
}
