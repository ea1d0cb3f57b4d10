//! Calendar date type used for cost and usage keys.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A calendar day in UTC.
///
/// This is a newtype wrapper around `chrono::NaiveDate`. Cost and usage
/// keys use calendar day in UTC (per the persisted schema); there is no
/// time-of-day component anywhere in the allocation engine.
///
/// # Example
///
/// ```rust
/// use costflow_core::types::CostDate;
///
/// let d = CostDate::from_ymd(2024, 1, 1).unwrap();
/// assert_eq!(d.add_days(1).day(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostDate(NaiveDate);

impl CostDate {
    /// Creates a new date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date is invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(CostDate)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Creates a date from an ISO 8601 string (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the string is not a valid date.
    pub fn parse(s: &str) -> CoreResult<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(CostDate)
            .map_err(|_| CoreError::invalid_date(format!("cannot parse: {s}")))
    }

    /// Wraps an existing `chrono::NaiveDate`.
    #[must_use]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Returns the underlying `chrono::NaiveDate`.
    #[must_use]
    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Adds (or, if negative, subtracts) a number of days.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + ChronoDuration::days(days))
    }

    /// Number of whole days between `self` and `other` (`self - other`).
    #[must_use]
    pub fn days_since(&self, other: &Self) -> i64 {
        (self.0 - other.0).num_days()
    }

    /// Returns an inclusive iterator over every day in `[self, end]`.
    ///
    /// # Panics
    ///
    /// Panics if `end` is before `self` (a window coordinator bug, not a
    /// runtime condition callers should handle).
    pub fn window_through(&self, end: Self) -> impl Iterator<Item = CostDate> {
        assert!(end >= *self, "window end must not precede window start");
        let days = end.days_since(self);
        let start = *self;
        (0..=days).map(move |offset| start.add_days(offset))
    }
}

impl fmt::Display for CostDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let d = CostDate::from_ymd(2024, 3, 15).unwrap();
        assert_eq!(d.to_string(), "2024-03-15");
        assert_eq!(CostDate::parse("2024-03-15").unwrap(), d);
    }

    #[test]
    fn test_invalid_date() {
        assert!(CostDate::from_ymd(2024, 2, 30).is_err());
    }

    #[test]
    fn test_window_through() {
        let start = CostDate::from_ymd(2024, 1, 1).unwrap();
        let end = CostDate::from_ymd(2024, 1, 3).unwrap();
        let days: Vec<_> = start.window_through(end).collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], start);
        assert_eq!(days[2], end);
    }

    #[test]
    fn test_add_days_negative() {
        let d = CostDate::from_ymd(2024, 1, 5).unwrap();
        assert_eq!(d.add_days(-4), CostDate::from_ymd(2024, 1, 1).unwrap());
    }
}
