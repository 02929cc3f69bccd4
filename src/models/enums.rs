//! Enumeration types for constrained values.

use serde::{Deserialize, Serialize};

/// Kind of a recorded transaction.
///
/// Only [`TransactionType::Expense`] is produced by the expense flow; the
/// other kinds exist so that previously saved data round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
    /// Money moved to savings.
    Savings,
    /// Money paid towards a debt.
    Debt,
}

/// Budget classification in the needs / wants / savings split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Essential spending.
    Needs,
    /// Discretionary spending.
    Wants,
    /// Money set aside.
    Savings,
}

impl Classification {
    /// All classifications in display order.
    pub const ALL: [Self; 3] = [Self::Needs, Self::Wants, Self::Savings];

    /// Human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Needs => "Needs",
            Self::Wants => "Wants",
            Self::Savings => "Savings",
        }
    }
}

/// Period the quoted interest rate of a debt applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestType {
    /// Rate is charged per month.
    Monthly,
    /// Rate is quoted per year (APR).
    Annual,
}

/// How often a recurring income is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeFrequency {
    /// Every week (52 times a year).
    Weekly,
    /// Every other week (26 times a year).
    BiWeekly,
    /// Every month.
    Monthly,
    /// Once a year.
    Annually,
}
