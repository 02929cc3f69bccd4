//! Personal finance state store.
//!
//! This crate keeps budgets, expenses, debts, incomes and savings goals in a
//! single state tree. Every change goes through a typed
//! [`store::Action`], the tree is saved to a pluggable
//! [`storage::StateStorage`] after each one, and the figures shown to the
//! user (category totals, payoff progress, monthly income buckets) are
//! derived on demand by [`calc`].
//!
//! ```rust
//! use fintrack::calc::DashboardSummary;
//! use fintrack::models::{Income, NaiveDate};
//! use fintrack::storage::InMemoryStorage;
//! use fintrack::store::{Action, FinanceStore};
//!
//! let mut store = FinanceStore::open(InMemoryStorage::new()).unwrap();
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! store.dispatch(Action::AddIncome(Income::new("Salary", 3000.0, date))).unwrap();
//! let summary = DashboardSummary::from_state(store.state());
//! assert_eq!(summary.spendable_balance, 3000.0);
//! ```

pub mod calc;
pub mod draft;
pub mod error;
pub mod format;
pub mod models;
pub mod storage;
pub mod store;

pub use error::{FinanceError, Result};
pub use store::{Action, FinanceState, FinanceStore};
