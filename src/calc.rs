//! Derived values computed from the state tree.
//!
//! Every function here is pure and cheap enough to call on each render.
//! The store reuses the debt helpers for its payoff check.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};

use crate::models::{
    Budget, Classification, Contribution, Debt, Income, IncomeFrequency, InterestType, MonthKey,
    MonthlyIncome, Payment, SavingsGoal, Transaction, TransactionType,
};
use crate::store::FinanceState;

/// Today's date in the local calendar.
#[inline]
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ── Budgets ─────────────────────────────────────────────────────────────

/// Sum of a budget's subcategory allocations.
#[inline]
#[must_use]
pub fn category_total(budget: &Budget) -> f64 {
    budget
        .sub_categories
        .iter()
        .fold(0.0, |sum, sub| sum + sub.amount)
}

/// `amount` as a percentage of `total`, or `0` when `total` is not
/// positive.
#[inline]
#[must_use]
pub fn percentage(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

/// Sum of every budget's category total.
#[inline]
#[must_use]
pub fn budgets_total(budgets: &[Budget]) -> f64 {
    budgets
        .iter()
        .fold(0.0, |sum, budget| sum + category_total(budget))
}

/// Budgets ordered by category total, largest first.
///
/// The sort is stable: budgets with equal totals keep their relative
/// order.
#[must_use]
pub fn sort_by_amount_descending(budgets: &[Budget]) -> Vec<Budget> {
    let mut sorted = budgets.to_vec();
    sorted.sort_by(|a, b| category_total(b).total_cmp(&category_total(a)));
    sorted
}

/// Budgets in one classification, largest first.
#[must_use]
pub fn budgets_in_classification(
    budgets: &[Budget],
    classification: Classification,
) -> Vec<Budget> {
    let matching: Vec<Budget> = budgets
        .iter()
        .filter(|budget| budget.classification == classification)
        .cloned()
        .collect();
    sort_by_amount_descending(&matching)
}

/// Sum of category totals within one classification.
#[inline]
#[must_use]
pub fn classification_total(budgets: &[Budget], classification: Classification) -> f64 {
    budgets
        .iter()
        .filter(|budget| budget.classification == classification)
        .fold(0.0, |sum, budget| sum + category_total(budget))
}

// ── Debts ───────────────────────────────────────────────────────────────

/// Per-month interest rate as a fraction.
///
/// A monthly rate is used as quoted; an annual rate is spread evenly over
/// twelve months.
#[inline]
#[must_use]
pub fn periodic_rate(interest_rate: f64, interest_type: InterestType) -> f64 {
    match interest_type {
        InterestType::Monthly => interest_rate / 100.0,
        InterestType::Annual => (interest_rate / 12.0) / 100.0,
    }
}

/// Simple (non-compounding) repayment total over `months`.
#[inline]
#[must_use]
pub fn projected_total(
    principal: f64,
    interest_rate: f64,
    interest_type: InterestType,
    months: f64,
) -> f64 {
    principal * (1.0 + periodic_rate(interest_rate, interest_type) * months)
}

/// Sum of payment amounts.
#[inline]
#[must_use]
pub fn total_paid(payments: &[Payment]) -> f64 {
    payments.iter().fold(0.0, |sum, payment| sum + payment.amount)
}

/// What is left to pay on a debt; negative when overpaid.
#[inline]
#[must_use]
pub fn remaining_balance(debt: &Debt) -> f64 {
    debt.total_amount - debt.total_paid()
}

/// Share of the projected total already paid, in percent.
#[inline]
#[must_use]
pub fn payoff_percentage(debt: &Debt) -> f64 {
    percentage(debt.total_paid(), debt.total_amount)
}

/// Sum of minimum payments across active debts.
#[inline]
#[must_use]
pub fn total_minimum_payments(debts: &[Debt]) -> f64 {
    debts.iter().fold(0.0, |sum, debt| sum + debt.minimum_payment)
}

/// Sum of remaining balances across active debts.
#[inline]
#[must_use]
pub fn total_remaining_debt(debts: &[Debt]) -> f64 {
    debts
        .iter()
        .fold(0.0, |sum, debt| sum + remaining_balance(debt))
}

/// Active debts ordered by projected total, smallest first.
#[must_use]
pub fn sort_debts_by_total(debts: &[Debt]) -> Vec<Debt> {
    let mut sorted = debts.to_vec();
    sorted.sort_by(|a, b| a.total_amount.total_cmp(&b.total_amount));
    sorted
}

// ── Income ──────────────────────────────────────────────────────────────

/// Converts a periodic amount to its monthly equivalent.
#[inline]
#[must_use]
pub fn monthly_equivalent(amount: f64, frequency: IncomeFrequency) -> f64 {
    match frequency {
        IncomeFrequency::Weekly => amount * 52.0 / 12.0,
        IncomeFrequency::BiWeekly => amount * 26.0 / 12.0,
        IncomeFrequency::Monthly => amount,
        IncomeFrequency::Annually => amount / 12.0,
    }
}

/// Sum of monthly equivalents over `(amount, frequency)` pairs.
#[inline]
#[must_use]
pub fn monthly_total<I>(sources: I) -> f64
where
    I: IntoIterator<Item = (f64, IncomeFrequency)>,
{
    sources
        .into_iter()
        .fold(0.0, |sum, (amount, frequency)| {
            sum + monthly_equivalent(amount, frequency)
        })
}

/// Sum of income amounts.
#[inline]
#[must_use]
pub fn total_income(incomes: &[Income]) -> f64 {
    incomes.iter().fold(0.0, |sum, income| sum + income.amount)
}

/// Whether two dates fall in the same calendar month.
#[inline]
#[must_use]
pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Groups incomes into monthly buckets, most recent month first.
///
/// Within a bucket incomes keep their input order.
#[must_use]
pub fn organize_income_by_month(incomes: &[Income]) -> Vec<MonthlyIncome> {
    let mut grouped: BTreeMap<MonthKey, Vec<Income>> = BTreeMap::new();
    for income in incomes {
        grouped
            .entry(income.month_key())
            .or_default()
            .push(income.clone());
    }
    grouped
        .into_iter()
        .rev()
        .map(|(key, bucket)| MonthlyIncome::new(key, bucket))
        .collect()
}

/// Files an income into the archive, returning the new archive.
///
/// The income joins its month's bucket if one exists (the bucket total is
/// re-summed); otherwise a new bucket is inserted so that the archive
/// stays ordered most recent month first.
#[must_use]
pub fn archive_income(buckets: &[MonthlyIncome], income: Income) -> Vec<MonthlyIncome> {
    let key = income.month_key();
    let mut archive = buckets.to_vec();
    if let Some(bucket) = archive.iter_mut().find(|bucket| bucket.month_key == key) {
        bucket.incomes.push(income);
        bucket.total_income = total_income(&bucket.incomes);
        return archive;
    }
    let position = archive
        .iter()
        .position(|bucket| bucket.month_key < key)
        .unwrap_or(archive.len());
    archive.insert(position, MonthlyIncome::new(key, vec![income]));
    archive
}

// ── Savings ─────────────────────────────────────────────────────────────

/// Sum of contribution amounts.
#[inline]
#[must_use]
pub fn total_contributed(contributions: &[Contribution]) -> f64 {
    contributions
        .iter()
        .fold(0.0, |sum, contribution| sum + contribution.amount)
}

/// Target minus contributions. Not clamped at zero.
#[inline]
#[must_use]
pub fn savings_remaining(goal: &SavingsGoal) -> f64 {
    goal.target_amount - total_contributed(&goal.contributions)
}

// ── Expenses ────────────────────────────────────────────────────────────

/// Sum of expense-type transactions.
#[inline]
#[must_use]
pub fn total_expenses(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Expense)
        .fold(0.0, |sum, tx| sum + tx.amount)
}

// ── Dashboard ───────────────────────────────────────────────────────────

/// Headline figures shown on the overview screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSummary {
    /// Current-month income.
    pub monthly_income: f64,
    /// Sum of minimum payments on active debts.
    pub minimum_payments: f64,
    /// Income left after minimum payments; may be negative.
    pub spendable_balance: f64,
    /// Sum of recorded expenses.
    pub total_expenses: f64,
    /// Sum of all savings contributions.
    pub total_savings: f64,
    /// Sum of remaining balances on active debts.
    pub total_debt: f64,
}

impl DashboardSummary {
    /// Computes the summary for a state tree.
    #[inline]
    #[must_use]
    pub fn from_state(state: &FinanceState) -> Self {
        let monthly_income = total_income(&state.current_month_incomes);
        let minimum_payments = total_minimum_payments(&state.debts);
        Self {
            monthly_income,
            minimum_payments,
            spendable_balance: monthly_income - minimum_payments,
            total_expenses: total_expenses(&state.transactions),
            total_savings: state
                .savings_goals
                .iter()
                .fold(0.0, |sum, goal| sum + goal.total_contributed()),
            total_debt: total_remaining_debt(&state.debts),
        }
    }
}
