//! Debt, payment, and completed-debt models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DebtId, InterestType, PaymentId};

/// A single payment made against a debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Amount paid.
    pub amount: f64,
    /// Calendar date of the payment.
    pub date: NaiveDate,
}

impl Payment {
    /// Builds a payment with a freshly generated identifier.
    #[inline]
    #[must_use]
    pub fn new(amount: f64, date: NaiveDate) -> Self {
        Self {
            id: PaymentId::random(),
            amount,
            date,
        }
    }
}

/// Parameters for a new debt, before the repayment total is projected.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDebt {
    /// Display name.
    pub name: String,
    /// Amount borrowed.
    pub principal: f64,
    /// Interest rate in percent.
    pub interest_rate: f64,
    /// Period the rate applies to.
    pub interest_type: InterestType,
    /// Repayment horizon in months; fractional terms are allowed.
    pub months: f64,
    /// Minimum monthly payment.
    pub minimum_payment: f64,
}

impl NewDebt {
    /// Projects the repayment total and builds the debt.
    ///
    /// The total is computed here once and never again; later edits to
    /// principal, rate or term leave it untouched.
    #[inline]
    #[must_use]
    pub fn build(self, date_added: NaiveDate) -> Debt {
        let total_amount = crate::calc::projected_total(
            self.principal,
            self.interest_rate,
            self.interest_type,
            self.months,
        );
        Debt {
            id: DebtId::random(),
            name: self.name,
            principal: self.principal,
            interest_rate: self.interest_rate,
            interest_type: self.interest_type,
            months: self.months,
            total_amount,
            minimum_payment: self.minimum_payment,
            payments: Vec::new(),
            date_added,
        }
    }
}

/// An active debt being paid off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    /// Unique identifier.
    pub id: DebtId,
    /// Display name.
    pub name: String,
    /// Amount borrowed.
    pub principal: f64,
    /// Interest rate in percent.
    pub interest_rate: f64,
    /// Period the rate applies to.
    pub interest_type: InterestType,
    /// Repayment horizon in months; fractional terms are allowed.
    pub months: f64,
    /// Simple-interest repayment total, fixed at creation.
    pub total_amount: f64,
    /// Minimum monthly payment.
    pub minimum_payment: f64,
    /// Payments made so far, in the order they were recorded.
    pub payments: Vec<Payment>,
    /// Date the debt was added.
    pub date_added: NaiveDate,
}

impl Debt {
    /// Sum of all payments made so far.
    #[inline]
    #[must_use]
    pub fn total_paid(&self) -> f64 {
        crate::calc::total_paid(&self.payments)
    }

    /// Whether the payments cover the projected total.
    #[inline]
    #[must_use]
    pub fn is_paid_off(&self) -> bool {
        self.total_paid() >= self.total_amount
    }

    /// Snapshots this debt as cleared on the given date.
    #[inline]
    #[must_use]
    pub fn to_completed(&self, date_cleared: NaiveDate) -> CompletedDebt {
        CompletedDebt {
            id: self.id.clone(),
            name: self.name.clone(),
            principal: self.principal,
            amount_paid: self.total_paid(),
            date_cleared,
        }
    }
}

/// Terminal record of a debt that was paid off or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedDebt {
    /// Identifier of the original debt.
    pub id: DebtId,
    /// Display name.
    pub name: String,
    /// Amount originally borrowed.
    pub principal: f64,
    /// Sum of payments made before the debt was cleared.
    pub amount_paid: f64,
    /// Date the debt left the active set.
    pub date_cleared: NaiveDate,
}
