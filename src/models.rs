//! Data models for the finance state tree.
//!
//! This module contains strongly-typed representations of every entity
//! the store owns, newtype ID wrappers, and enumeration types for
//! constrained values. Field names serialize in camelCase so previously
//! saved state keeps loading.

mod budget;
mod currency;
mod debt;
mod enums;
mod ids;
mod income;
mod savings;
mod transaction;

pub use budget::{Budget, SubCategory};
pub use chrono::NaiveDate;
pub use currency::Currency;
pub use debt::{CompletedDebt, Debt, NewDebt, Payment};
pub use enums::{Classification, IncomeFrequency, InterestType, TransactionType};
pub use ids::{
    BudgetId, ContributionId, DebtId, IncomeId, PaymentId, SavingsGoalId, TransactionId,
};
pub use income::{Income, MonthKey, MonthlyIncome};
pub use savings::{CompletedSaving, Contribution, SavingsGoal};
pub use transaction::Transaction;
