//! Transaction model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{TransactionId, TransactionType};

/// A recorded money movement (in practice, an expense).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Amount moved. Not validated for sign.
    pub amount: f64,
    /// Free-form description.
    pub description: String,
    /// Budget category label the transaction was filed under.
    pub category: String,
    /// Calendar date (yyyy-MM-dd).
    pub date: NaiveDate,
    /// Kind of transaction.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    /// Builds an expense with a freshly generated identifier.
    #[inline]
    #[must_use]
    pub fn expense<D, C>(amount: f64, description: D, category: C, date: NaiveDate) -> Self
    where
        D: Into<String>,
        C: Into<String>,
    {
        Self {
            id: TransactionId::random(),
            amount,
            description: description.into(),
            category: category.into(),
            date,
            kind: TransactionType::Expense,
        }
    }
}
