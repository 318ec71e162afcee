use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ImmocalcError;

/// A calendar month; the key of every monthly row. Serialises as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// `None` unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            // Saturates instead of wrapping for absurd horizons
            year: ordinal
                .div_euclid(12)
                .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn add_months(self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(self, earlier: YearMonth) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// Months from this one through December, inclusive.
    pub fn months_left_in_year(self) -> u32 {
        12 - (self.month - 1)
    }

    /// Every month from `self` through `last`, inclusive. Empty if `last < self`.
    pub fn through(self, last: YearMonth) -> impl Iterator<Item = YearMonth> {
        let count = (last.months_since(self) + 1).max(0);
        (0..count).map(move |offset| self.add_months(offset))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ImmocalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ImmocalcError::DateError(format!("'{s}' is not a YYYY-MM month"));
        let (year, month) = s.trim().rsplit_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ImmocalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
