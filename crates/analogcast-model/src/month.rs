// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ValidationError;

pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 9999;

/// A calendar month, stored as `year * 12 + (month - 1)` so that ordering and
/// arithmetic are plain integer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(i32);

/// The month a snapshot describes (`YYYY-MM`).
pub type Period = Month;

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError(format!(
                "year {year} outside supported range {MIN_YEAR}..={MAX_YEAR}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(ValidationError(format!("month {month} must be in 1..=12")));
        }
        Ok(Self(year * 12 + month as i32 - 1))
    }

    /// Accepts `YYYY-MM` and `YYYY-MM-DD`; the day is validated and dropped.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let mut parts = s.split('-');
        let year = parts
            .next()
            .filter(|p| p.len() == 4 && p.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| ValidationError(format!("month `{s}` must be YYYY-MM or YYYY-MM-DD")))?;
        let month = parts
            .next()
            .filter(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| ValidationError(format!("month `{s}` must be YYYY-MM or YYYY-MM-DD")))?;
        let day = parts.next();
        if parts.next().is_some() {
            return Err(ValidationError(format!(
                "month `{s}` must be YYYY-MM or YYYY-MM-DD"
            )));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| ValidationError(format!("invalid year in `{s}`")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| ValidationError(format!("invalid month in `{s}`")))?;
        let parsed = Self::new(year, month)?;
        if let Some(day) = day {
            if day.len() != 2 || !day.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError(format!("invalid day in `{s}`")));
            }
            let day: u32 = day
                .parse()
                .map_err(|_| ValidationError(format!("invalid day in `{s}`")))?;
            if day == 0 || day > parsed.days_in_month() {
                return Err(ValidationError(format!("day {day} out of range in `{s}`")));
            }
        }
        Ok(parsed)
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.0.div_euclid(12)
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        (self.0.rem_euclid(12) + 1) as u32
    }

    #[must_use]
    pub const fn ordinal(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn add_months(self, months: i32) -> Self {
        Self(self.0 + months)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        self.add_months(1)
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        self.add_months(-1)
    }

    /// Signed number of months from `self` to `later`.
    #[must_use]
    pub const fn months_until(self, later: Self) -> i32 {
        later.0 - self.0
    }

    /// First day of the month as an ISO date, the format the website charts use.
    #[must_use]
    pub fn iso_date(self) -> String {
        format!("{self}-01")
    }

    #[must_use]
    pub const fn days_in_month(self) -> u32 {
        match self.month() {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            _ => {
                let y = self.year();
                if (y % 4 == 0 && y % 100 != 0) || y % 400 == 0 {
                    29
                } else {
                    28
                }
            }
        }
    }

    /// Inclusive range iterator `self..=last`.
    pub fn through(self, last: Self) -> impl Iterator<Item = Month> {
        (self.0..=last.0).map(Month)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl From<Month> for String {
    fn from(value: Month) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Month {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl FromStr for Month {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::Month;

    #[test]
    fn parse_accepts_month_and_date_forms() {
        let a = Month::parse("2024-02").expect("month");
        let b = Month::parse("2024-02-29").expect("leap day");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2024-02");
        assert_eq!(a.iso_date(), "2024-02-01");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in ["2024", "2024-13", "2024-00", "24-01", "2023-02-29", "2024-01-01-01", "abcd-ef"] {
            assert!(Month::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn arithmetic_crosses_year_boundaries() {
        let dec = Month::parse("2023-12").expect("month");
        assert_eq!(dec.next().to_string(), "2024-01");
        assert_eq!(dec.add_months(-12).to_string(), "2022-12");
        assert_eq!(dec.months_until(Month::parse("2024-06").expect("month")), 6);
        let months: Vec<String> = dec.through(dec.add_months(2)).map(|m| m.to_string()).collect();
        assert_eq!(months, ["2023-12", "2024-01", "2024-02"]);
    }
}
