//! Recurrence rule parsing and next-occurrence resolution.
//!
//! # Responsibility
//! - Parse compact rule strings (`y`, `d <n>`) into [`RecurrenceRule`].
//! - Compute the next occurrence of a recurring task strictly after a
//!   reference date.
//!
//! # Invariants
//! - [`resolve`] is pure: no I/O, no shared state, same inputs give the same
//!   output.
//! - A successful result is always strictly later than `now` and fits the
//!   `YYYYMMDD` form.
//! - Every-N-days offsets are limited to `1..=MAX_DAY_OFFSET`.

use crate::date::{CalendarDate, MAX_CANONICAL_YEAR};
use chrono::{Datelike, Days, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::IntErrorKind;

/// Largest accepted offset for `d <n>` rules.
pub const MAX_DAY_OFFSET: u32 = 400;

const YEARLY_TOKEN: &str = "y";
const DAILY_TOKEN: &str = "d";

/// Classified resolver failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// Rule string is empty.
    MissingRule,
    /// Base date is not a valid `YYYYMMDD` value.
    MalformedBaseDate(String),
    /// `d` rule without a positive integer offset.
    MalformedMode(String),
    /// `d` rule offset above [`MAX_DAY_OFFSET`].
    OffsetTooLarge(u64),
    /// Unsupported recurrence class.
    InvalidRule(String),
    /// Next occurrence lies past the last `YYYYMMDD` date.
    DateOutOfRange(String),
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRule => write!(f, "recurrence rule is missing"),
            Self::MalformedBaseDate(value) => {
                write!(f, "base date `{value}` is not a valid YYYYMMDD date")
            }
            Self::MalformedMode(rule) => write!(f, "malformed recurrence mode `{rule}`"),
            Self::OffsetTooLarge(days) => write!(
                f,
                "offset of {days} days exceeds the {MAX_DAY_OFFSET} day limit"
            ),
            Self::InvalidRule(rule) => write!(f, "invalid recurrence rule `{rule}`"),
            Self::DateOutOfRange(rule) => write!(
                f,
                "next occurrence of `{rule}` falls after year {MAX_CANONICAL_YEAR}"
            ),
        }
    }
}

impl Error for RecurrenceError {}

/// Parsed recurrence class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceRule {
    /// Same month/day every year; Feb 29 lands on Mar 1 in non-leap years.
    Yearly,
    /// Every `n` calendar days, `1 <= n <= MAX_DAY_OFFSET`.
    EveryNDays(u32),
}

impl RecurrenceRule {
    /// Parses a whitespace-separated rule string.
    ///
    /// Tokens after `y` and after the `d` offset are ignored.
    pub fn parse(rule: &str) -> Result<Self, RecurrenceError> {
        if rule.is_empty() {
            return Err(RecurrenceError::MissingRule);
        }

        let mut tokens = rule.split_whitespace();
        match tokens.next() {
            Some(YEARLY_TOKEN) => Ok(Self::Yearly),
            Some(DAILY_TOKEN) => {
                let offset = tokens
                    .next()
                    .ok_or_else(|| RecurrenceError::MalformedMode(rule.to_string()))?;
                parse_day_offset(rule, offset).map(Self::EveryNDays)
            }
            _ => Err(RecurrenceError::InvalidRule(rule.to_string())),
        }
    }

    /// Returns the first occurrence after `base` that is strictly later than `now`.
    ///
    /// At least one step is always taken, so a `base` already in the future
    /// still advances by one period.
    ///
    /// # Errors
    /// - [`RecurrenceError::DateOutOfRange`] when the occurrence would fall
    ///   after year 9999.
    pub fn next_after(
        self,
        base: CalendarDate,
        now: CalendarDate,
    ) -> Result<CalendarDate, RecurrenceError> {
        let base = base.naive();
        let now = now.naive();
        let next = match self {
            Self::Yearly => next_yearly(base, now),
            Self::EveryNDays(days) => next_every_n_days(base, now, days),
        };
        next.and_then(CalendarDate::from_naive_canonical)
            .ok_or_else(|| RecurrenceError::DateOutOfRange(self.to_string()))
    }
}

impl Display for RecurrenceRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yearly => write!(f, "{YEARLY_TOKEN}"),
            Self::EveryNDays(days) => write!(f, "{DAILY_TOKEN} {days}"),
        }
    }
}

/// Resolves the next occurrence of `rule` starting at `base`, strictly after `now`.
///
/// `now` is expected to be normalized by the caller; `base` is parsed here.
///
/// # Errors
/// - [`RecurrenceError::MissingRule`] for an empty rule.
/// - [`RecurrenceError::MalformedBaseDate`] when `base` is not `YYYYMMDD`.
/// - [`RecurrenceError::MalformedMode`], [`RecurrenceError::OffsetTooLarge`]
///   and [`RecurrenceError::InvalidRule`] for rule syntax problems.
/// - [`RecurrenceError::DateOutOfRange`] when no occurrence fits `YYYYMMDD`.
pub fn resolve(
    now: CalendarDate,
    base: &str,
    rule: &str,
) -> Result<CalendarDate, RecurrenceError> {
    if rule.is_empty() {
        return Err(RecurrenceError::MissingRule);
    }
    let base = CalendarDate::parse_canonical(base)
        .map_err(|_| RecurrenceError::MalformedBaseDate(base.to_string()))?;
    let rule = RecurrenceRule::parse(rule)?;
    rule.next_after(base, now)
}

fn parse_day_offset(rule: &str, token: &str) -> Result<u32, RecurrenceError> {
    let days = match token.parse::<u64>() {
        Ok(days) => days,
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => {
            return Err(RecurrenceError::OffsetTooLarge(u64::MAX));
        }
        Err(_) => return Err(RecurrenceError::MalformedMode(rule.to_string())),
    };

    if days == 0 {
        return Err(RecurrenceError::MalformedMode(rule.to_string()));
    }
    if days > u64::from(MAX_DAY_OFFSET) {
        return Err(RecurrenceError::OffsetTooLarge(days));
    }
    // Bounded by MAX_DAY_OFFSET above.
    Ok(days as u32)
}

/// Steps one year at a time from the previous candidate.
///
/// Once a Feb 29 base folds to Mar 1 it stays on Mar 1.
fn next_yearly(base: NaiveDate, now: NaiveDate) -> Option<NaiveDate> {
    let mut candidate = base;
    loop {
        candidate = anniversary(candidate, candidate.year().checked_add(1)?)?;
        if candidate > now {
            return Some(candidate);
        }
    }
}

/// Same month/day as `date` in `year`, or Mar 1 when that day does not exist.
fn anniversary(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

fn next_every_n_days(base: NaiveDate, now: NaiveDate, days: u32) -> Option<NaiveDate> {
    let step = Days::new(u64::from(days));
    let mut candidate = base;
    loop {
        candidate = candidate.checked_add_days(step)?;
        if candidate > now {
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve, RecurrenceError, RecurrenceRule, MAX_DAY_OFFSET};
    use crate::date::CalendarDate;

    fn date(value: &str) -> CalendarDate {
        CalendarDate::parse_canonical(value).unwrap()
    }

    fn next(now: &str, base: &str, rule: &str) -> Result<String, RecurrenceError> {
        resolve(date(now), base, rule).map(|value| value.to_string())
    }

    #[test]
    fn yearly_from_leap_day_folds_to_march_first() {
        assert_eq!(next("20250301", "20240229", "y").unwrap(), "20260301");
        assert_eq!(next("20250228", "20240229", "y").unwrap(), "20250301");
    }

    #[test]
    fn yearly_leap_day_stays_on_march_first_after_folding() {
        assert_eq!(next("20270601", "20240229", "y").unwrap(), "20280301");
        assert_eq!(next("20280301", "20240229", "y").unwrap(), "20290301");
    }

    #[test]
    fn occurrences_past_year_9999_are_out_of_range() {
        assert_eq!(
            next("99991231", "99991231", "d 1"),
            Err(RecurrenceError::DateOutOfRange("d 1".to_string()))
        );
        assert_eq!(
            next("99990601", "99980601", "y"),
            Err(RecurrenceError::DateOutOfRange("y".to_string()))
        );
        assert_eq!(next("99991230", "99991229", "d 1").unwrap(), "99991231");
    }

    #[test]
    fn yearly_keeps_month_and_day() {
        assert_eq!(next("20240101", "20160705", "y").unwrap(), "20240705");
        assert_eq!(next("20240705", "20160705", "y").unwrap(), "20250705");
    }

    #[test]
    fn yearly_ignores_extra_tokens() {
        assert_eq!(next("20240101", "20230615", "y 5 x").unwrap(), "20240615");
    }

    #[test]
    fn every_n_days_steps_past_now() {
        assert_eq!(next("20240110", "20240101", "d 7").unwrap(), "20240115");
        assert_eq!(next("20240108", "20240101", "d 7").unwrap(), "20240115");
        assert_eq!(next("20240107", "20240101", "d 7").unwrap(), "20240108");
    }

    #[test]
    fn future_base_still_advances_one_period() {
        assert_eq!(next("20240101", "20240301", "d 1").unwrap(), "20240302");
        assert_eq!(next("20240101", "20240301", "y").unwrap(), "20250301");
    }

    #[test]
    fn every_n_days_accepts_upper_bound() {
        let rule = format!("d {MAX_DAY_OFFSET}");
        assert_eq!(next("20240101", "20240101", &rule).unwrap(), "20250204");
    }

    #[test]
    fn every_n_days_crosses_month_and_year_boundaries() {
        assert_eq!(next("20231231", "20231225", "d 10").unwrap(), "20240104");
        assert_eq!(next("20240228", "20240227", "d 2").unwrap(), "20240229");
    }

    #[test]
    fn classified_errors() {
        assert_eq!(
            next("20240601", "20240101", "d 401"),
            Err(RecurrenceError::OffsetTooLarge(401))
        );
        assert_eq!(
            next("20240601", "20240101", ""),
            Err(RecurrenceError::MissingRule)
        );
        assert!(matches!(
            next("20240601", "20240101", "w 1"),
            Err(RecurrenceError::InvalidRule(_))
        ));
        assert!(matches!(
            next("20240601", "20240101", "d abc"),
            Err(RecurrenceError::MalformedMode(_))
        ));
        assert!(matches!(
            next("20240601", "20240101", "d"),
            Err(RecurrenceError::MalformedMode(_))
        ));
        assert!(matches!(
            next("20240601", "20240101", "d 0"),
            Err(RecurrenceError::MalformedMode(_))
        ));
        assert!(matches!(
            next("20240601", "20240101", "d -3"),
            Err(RecurrenceError::MalformedMode(_))
        ));
        assert!(matches!(
            next("20240601", "2024-01-01", "d 3"),
            Err(RecurrenceError::MalformedBaseDate(_))
        ));
    }

    #[test]
    fn huge_offset_is_reported_as_too_large() {
        assert!(matches!(
            next("20240601", "20240101", "d 99999999999999999999999"),
            Err(RecurrenceError::OffsetTooLarge(_))
        ));
    }

    #[test]
    fn unsupported_classes_are_invalid() {
        for rule in ["m 1", "w 1,2,3", "Y", "dd 3", " "] {
            assert!(
                matches!(RecurrenceRule::parse(rule), Err(RecurrenceError::InvalidRule(_))),
                "rule `{rule}` should be invalid"
            );
        }
    }

    #[test]
    fn result_is_strictly_after_now_for_many_inputs() {
        let bases = ["20200229", "20231231", "20240101", "20240615"];
        let nows = ["20191231", "20240101", "20240229", "20250301", "20300101"];
        let rules = ["y", "d 1", "d 7", "d 30", "d 400"];
        for base in bases {
            for now in nows {
                for rule in rules {
                    let result = resolve(date(now), base, rule).unwrap();
                    assert!(result > date(now), "{base} {rule} {now} -> {result}");
                    assert_eq!(resolve(date(now), base, rule).unwrap(), result);
                }
            }
        }
    }

    #[test]
    fn every_n_days_takes_floor_plus_one_steps() {
        let base = date("20240101");
        let now = date("20240301");
        for days in [1_u32, 3, 7, 13, 59, 60, 61, 400] {
            let result = RecurrenceRule::EveryNDays(days).next_after(base, now).unwrap();
            let elapsed = (now.naive() - base.naive()).num_days();
            let expected_steps = (elapsed / i64::from(days) + 1).max(1);
            let steps = (result.naive() - base.naive()).num_days() / i64::from(days);
            assert_eq!(steps, expected_steps, "offset {days}");
        }
    }

    #[test]
    fn rule_display_is_canonical() {
        assert_eq!(RecurrenceRule::parse("d   14").unwrap().to_string(), "d 14");
        assert_eq!(RecurrenceRule::parse("y").unwrap().to_string(), "y");
    }
}
