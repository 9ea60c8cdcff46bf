//! The month key that partitions transaction storage.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::Date;

use crate::Error;

/// A calendar month, the unit transactions are partitioned by.
///
/// The canonical text form is "YYYY-MM" with a zero-padded month, e.g.
/// "2024-07". The text form sorts chronologically, and so does the
/// derived [Ord].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    year: i32,
    month: u8,
}

impl PeriodKey {
    /// Create a period key, checking that `month` is a calendar month.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if `month` is not in `1..=12`.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }

        Ok(Self { year, month })
    }

    /// The period the given date falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month, 1 through 12.
    pub fn month(&self) -> u8 {
        self.month
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let invalid =
            || Error::InvalidPeriod(format!("'{string}' is not a period of the form YYYY-MM"));

        let (year, month) = string.split_once('-').ok_or_else(invalid)?;

        // Insist on the canonical widths so "2024-7" and "24-07" do not
        // silently alias the zero-padded form.
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(de::Error::custom)
    }
}
