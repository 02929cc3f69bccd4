//! Income entries and monthly archive buckets.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

use super::IncomeId;
use crate::error::{FinanceError, Result};

/// A single income entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    /// Unique identifier.
    pub id: IncomeId,
    /// Where the money came from.
    pub source: String,
    /// Amount received.
    pub amount: f64,
    /// Calendar date the income was earned.
    pub date: NaiveDate,
}

impl Income {
    /// Builds an income entry with a freshly generated identifier.
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>>(source: S, amount: f64, date: NaiveDate) -> Self {
        Self {
            id: IncomeId::random(),
            source: source.into(),
            amount,
            date,
        }
    }

    /// Key of the month bucket this income belongs to.
    #[inline]
    #[must_use]
    pub fn month_key(&self) -> MonthKey {
        MonthKey::of(self.date)
    }
}

/// Calendar month identifying an archive bucket.
///
/// Serialized as `"{year}-{month}"` with a zero-based month, so January
/// 2024 is `"2024-0"` and December 2023 is `"2023-11"`. Ordering is
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    /// Calendar year.
    year: i32,
    /// Zero-based month (0 = January).
    month0: u32,
}

impl MonthKey {
    /// Creates a key from a year and a zero-based month.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::InvalidMonthKey`] if `month0` is not in
    /// `0..12`.
    #[inline]
    pub fn new(year: i32, month0: u32) -> Result<Self> {
        if month0 < 12 {
            Ok(Self { year, month0 })
        } else {
            Err(FinanceError::InvalidMonthKey(format!("{year}-{month0}")))
        }
    }

    /// Key of the month containing `date`.
    #[inline]
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month0: date.month0(),
        }
    }

    /// Calendar year.
    #[inline]
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Zero-based month (0 = January).
    #[inline]
    #[must_use]
    pub const fn month0(self) -> u32 {
        self.month0
    }

    /// First day of the month.
    #[inline]
    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, 1)
    }

    /// Display name such as `"January 2024"`.
    #[inline]
    #[must_use]
    pub fn month_name(self) -> String {
        self.first_day()
            .map_or_else(|| self.to_string(), crate::format::month_name)
    }
}

impl core::fmt::Display for MonthKey {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.year, self.month0)
    }
}

impl core::str::FromStr for MonthKey {
    type Err = FinanceError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FinanceError::InvalidMonthKey(s.to_owned());
        // Split on the last '-' so negative years still parse.
        let (year_part, month_part) = s.rsplit_once('-').ok_or_else(invalid)?;
        let year = year_part.parse::<i32>().map_err(|_err| invalid())?;
        let month0 = month_part.parse::<u32>().map_err(|_err| invalid())?;
        Self::new(year, month0).map_err(|_err| invalid())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = FinanceError;

    #[inline]
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    #[inline]
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Archived incomes for one calendar month.
///
/// `total_income` always equals the sum of `incomes[].amount` after any
/// store transition that touches the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyIncome {
    /// Bucket key.
    pub month_key: MonthKey,
    /// Display name such as `"January 2024"`.
    pub month_name: String,
    /// Sum of the bucket's income amounts.
    pub total_income: f64,
    /// Incomes in this month.
    pub incomes: Vec<Income>,
}

impl MonthlyIncome {
    /// Creates a bucket from a list of incomes, computing its total.
    #[inline]
    #[must_use]
    pub fn new(month_key: MonthKey, incomes: Vec<Income>) -> Self {
        Self {
            month_key,
            month_name: month_key.month_name(),
            total_income: crate::calc::total_income(&incomes),
            incomes,
        }
    }
}
