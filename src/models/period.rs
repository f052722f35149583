//! Calendar month periods.
//!
//! This module contains the [`MonthPeriod`] type that scopes every ledger,
//! summary and fetch to one calendar month of one year.

use std::fmt;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A calendar month of a specific year.
///
/// # Example
///
/// ```
/// use attendance_ledger::models::MonthPeriod;
/// use chrono::NaiveDate;
///
/// let february = MonthPeriod::new(2024, 2).unwrap();
/// assert_eq!(february.days_in_month(), 29);
/// assert!(february.contains_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
/// assert_eq!(february.to_string(), "February 2024");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    /// Creates a period, rejecting months outside 1-12 and unrepresentable years.
    pub fn new(year: i32, month: u32) -> LedgerResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(LedgerError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The 1-based month.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The number of days in this month, accounting for leap years.
    pub fn days_in_month(&self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .with_day(self.days_in_month())
            .unwrap_or_else(|| self.first_day())
    }

    /// Every date of the month, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let first = self.first_day();
        let days = self.days_in_month();
        first.iter_days().take(days as usize)
    }

    /// Checks if a given date falls within this month.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The English month name, e.g. "February".
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(year: i32, month: u32) -> MonthPeriod {
        MonthPeriod::new(year, month).unwrap()
    }

    #[test]
    fn test_days_in_month_for_every_month_of_a_common_year() {
        let expected = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for (index, days) in expected.iter().enumerate() {
            assert_eq!(period(2023, index as u32 + 1).days_in_month(), *days);
        }
    }

    #[test]
    fn test_leap_year_february() {
        assert_eq!(period(2024, 2).days_in_month(), 29);
        assert_eq!(period(2000, 2).days_in_month(), 29);
        assert_eq!(period(1900, 2).days_in_month(), 28);
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let december = period(2024, 12);
        assert_eq!(december.days_in_month(), 31);
        assert_eq!(
            december.last_day(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(matches!(
            MonthPeriod::new(2024, 13),
            Err(LedgerError::InvalidPeriod { year: 2024, month: 13 })
        ));
        assert!(MonthPeriod::new(2024, 0).is_err());
    }

    #[test]
    fn test_dates_are_dense_and_ascending() {
        let dates: Vec<NaiveDate> = period(2023, 4).dates().collect();
        assert_eq!(dates.len(), 30);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        assert_eq!(dates[29], NaiveDate::from_ymd_opt(2023, 4, 30).unwrap());
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_contains_date_boundaries() {
        let march = period(2024, 3);
        assert!(march.contains_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(march.contains_date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!march.contains_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!march.contains_date(NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()));
    }

    #[test]
    fn test_containing_and_display() {
        let period = MonthPeriod::containing(NaiveDate::from_ymd_opt(2025, 11, 19).unwrap());
        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), 11);
        assert_eq!(period.to_string(), "November 2025");
    }
}
