// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").unwrap());

/// A calendar month keyed as `YYYYMM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, BudgetError> {
        if !(1..=12).contains(&month) {
            return Err(BudgetError::validation(format!(
                "Invalid month number {} in {:04}{:02}",
                month, year, month
            )));
        }
        if !(0..=9999).contains(&year) {
            return Err(BudgetError::validation(format!("Invalid year {}", year)));
        }
        Ok(Self { year, month })
    }

    pub fn parse(s: &str) -> Result<Self, BudgetError> {
        let s = s.trim();
        if !YEAR_MONTH_RE.is_match(s) {
            return Err(BudgetError::validation(format!(
                "Invalid year-month '{}', expected YYYYMM",
                s
            )));
        }
        // Both slices are ASCII digits after the regex check.
        let year: i32 = s[..4]
            .parse()
            .map_err(|_| BudgetError::validation(format!("Invalid year in '{}'", s)))?;
        let month: u32 = s[4..]
            .parse()
            .map_err(|_| BudgetError::validation(format!("Invalid month in '{}'", s)))?;
        Self::new(year, month)
    }

    /// Month of `date`. Fails outside the four-digit year range.
    pub fn from_date(date: NaiveDate) -> Result<Self, BudgetError> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Result<Self, BudgetError> {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn prev(&self) -> Result<Self, BudgetError> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// Month `n` steps after this one.
    pub fn plus(&self, n: u32) -> Result<Self, BudgetError> {
        let idx = self.year as i64 * 12 + (self.month as i64 - 1) + n as i64;
        let year = i32::try_from(idx / 12).map_err(|_| {
            BudgetError::validation(format!("{} plus {} months is out of range", self, n))
        })?;
        Self::new(year, (idx % 12) as u32 + 1)
    }

    pub fn first_day(&self) -> NaiveDate {
        // year/month are range-checked on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(first)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        YearMonth::parse(s)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = BudgetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        YearMonth::parse(&value)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Same day-of-month `n` months later, clamped to the last day of the target month.
pub fn add_months(date: NaiveDate, n: u32) -> Result<NaiveDate, BudgetError> {
    let target = YearMonth::from_date(date)?.plus(n)?;
    let day = date.day().min(target.last_day().day());
    NaiveDate::from_ymd_opt(target.year(), target.month(), day)
        .ok_or_else(|| BudgetError::validation(format!("No day {} in {}", day, target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_year() {
        let ym = YearMonth::parse("202412").unwrap();
        assert_eq!(ym.next().unwrap().to_string(), "202501");
        assert_eq!(ym.next().unwrap().prev().unwrap(), ym);
    }

    #[test]
    fn stepping_past_year_9999_fails() {
        let last = YearMonth::parse("999912").unwrap();
        assert!(last.next().is_err());
        assert!(last.plus(1).is_err());
        assert!(YearMonth::parse("000001").unwrap().prev().is_err());
    }

    #[test]
    fn last_day_handles_leap_years() {
        let feb = YearMonth::parse("202402").unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let dec = YearMonth::parse("999912").unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
    }

    #[test]
    fn rejects_malformed() {
        assert!(YearMonth::parse("2024-12").is_err());
        assert!(YearMonth::parse("202413").is_err());
        assert!(YearMonth::parse("202400").is_err());
        assert!(YearMonth::parse("20241").is_err());
    }

    #[test]
    fn plus_crosses_years() {
        let ym = YearMonth::parse("202411").unwrap();
        assert_eq!(ym.plus(0).unwrap(), ym);
        assert_eq!(ym.plus(3).unwrap().to_string(), "202502");
        assert_eq!(ym.plus(14).unwrap().to_string(), "202601");
    }

    #[test]
    fn add_months_clamps_day() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(add_months(d, 1).unwrap(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(add_months(d, 2).unwrap(), NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }
}
