//! The finance state tree, its actions and the persisting store.
//!
//! [`transition`] is the only place the state changes. It borrows the
//! current state, applies one [`Action`], and returns the next state.
//! [`FinanceStore`] owns the current state and a [`StateStorage`] backend,
//! and writes the whole tree back after every dispatched action.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calc;
use crate::error::Result;
use crate::models::{
    Budget, BudgetId, CompletedDebt, CompletedSaving, Contribution, ContributionId, Currency,
    Debt, DebtId, Income, IncomeId, MonthKey, MonthlyIncome, Payment, SavingsGoal,
    SavingsGoalId, Transaction,
};
use crate::storage::StateStorage;

/// Storage key the serialized state lives under.
pub const STATE_KEY: &str = "financeState";

/// The complete, persisted finance state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinanceState {
    /// Recorded transactions (expenses).
    pub transactions: Vec<Transaction>,
    /// Budget categories.
    pub budgets: Vec<Budget>,
    /// Debts still being paid off.
    pub debts: Vec<Debt>,
    /// Debts that were paid off or removed.
    pub completed_debts: Vec<CompletedDebt>,
    /// Savings goals still being saved for.
    pub savings_goals: Vec<SavingsGoal>,
    /// Savings goals whose target was reached.
    pub completed_savings: Vec<CompletedSaving>,
    /// Incomes for the month in progress.
    pub current_month_incomes: Vec<Income>,
    /// Archived incomes grouped by month, most recent first.
    pub monthly_incomes: Vec<MonthlyIncome>,
    /// Display currency.
    pub currency: Currency,
    /// Dark theme preference.
    pub dark_mode: bool,
}

/// A state tree where every field is optional.
///
/// Used to load persisted state: present fields replace the current ones,
/// absent fields are left alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialFinanceState {
    /// Replacement transactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    /// Replacement budgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budgets: Option<Vec<Budget>>,
    /// Replacement active debts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debts: Option<Vec<Debt>>,
    /// Replacement completed debts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_debts: Option<Vec<CompletedDebt>>,
    /// Replacement savings goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_goals: Option<Vec<SavingsGoal>>,
    /// Replacement completed savings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_savings: Option<Vec<CompletedSaving>>,
    /// Replacement current-month incomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_month_incomes: Option<Vec<Income>>,
    /// Replacement income archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_incomes: Option<Vec<MonthlyIncome>>,
    /// Replacement display currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    /// Replacement theme flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
}

impl PartialFinanceState {
    /// Overwrites the fields of `state` that are present in `self`.
    #[inline]
    pub fn merge_into(self, state: &mut FinanceState) {
        if let Some(transactions) = self.transactions {
            state.transactions = transactions;
        }
        if let Some(budgets) = self.budgets {
            state.budgets = budgets;
        }
        if let Some(debts) = self.debts {
            state.debts = debts;
        }
        if let Some(completed_debts) = self.completed_debts {
            state.completed_debts = completed_debts;
        }
        if let Some(savings_goals) = self.savings_goals {
            state.savings_goals = savings_goals;
        }
        if let Some(completed_savings) = self.completed_savings {
            state.completed_savings = completed_savings;
        }
        if let Some(current_month_incomes) = self.current_month_incomes {
            state.current_month_incomes = current_month_incomes;
        }
        if let Some(monthly_incomes) = self.monthly_incomes {
            state.monthly_incomes = monthly_incomes;
        }
        if let Some(currency) = self.currency {
            state.currency = currency;
        }
        if let Some(dark_mode) = self.dark_mode {
            state.dark_mode = dark_mode;
        }
    }
}

impl From<FinanceState> for PartialFinanceState {
    #[inline]
    fn from(state: FinanceState) -> Self {
        Self {
            transactions: Some(state.transactions),
            budgets: Some(state.budgets),
            debts: Some(state.debts),
            completed_debts: Some(state.completed_debts),
            savings_goals: Some(state.savings_goals),
            completed_savings: Some(state.completed_savings),
            current_month_incomes: Some(state.current_month_incomes),
            monthly_incomes: Some(state.monthly_incomes),
            currency: Some(state.currency),
            dark_mode: Some(state.dark_mode),
        }
    }
}

/// Every state change the store accepts.
///
/// Serialized adjacently tagged, e.g.
/// `{"kind": "DELETE_BUDGET", "payload": "budget-1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Action {
    /// Replace the display currency.
    SetCurrency(Currency),
    /// Replace the dark theme flag.
    SetDarkMode(bool),
    /// Append a transaction.
    AddTransaction(Transaction),
    /// Append a budget.
    AddBudget(Budget),
    /// Replace the budget with the same id.
    UpdateBudget(Budget),
    /// Remove a budget by id.
    DeleteBudget(BudgetId),
    /// Replace all budgets.
    SetBudgets(Vec<Budget>),
    /// Append a debt.
    AddDebt(Debt),
    /// Replace the debt with the same id.
    UpdateDebt(Debt),
    /// Move a debt to the completed list.
    #[serde(rename_all = "camelCase")]
    DeleteDebt {
        /// Debt to remove.
        id: DebtId,
        /// Date recorded on the completed entry.
        date_cleared: NaiveDate,
    },
    /// Record a payment, completing the debt once it is paid off.
    #[serde(rename_all = "camelCase")]
    AddPayment {
        /// Debt the payment is for.
        debt_id: DebtId,
        /// The payment.
        payment: Payment,
    },
    /// Append a completed debt record.
    AddCompletedDebt(CompletedDebt),
    /// Remove a completed debt record by id.
    DeleteCompletedDebt(DebtId),
    /// Remove every completed debt record.
    ClearCompletedDebts,
    /// Append an income to the current month.
    AddIncome(Income),
    /// Remove a current-month income by id.
    DeleteCurrentIncome(IncomeId),
    /// Replace the current-month incomes.
    SetCurrentMonthIncomes(Vec<Income>),
    /// Replace the income archive.
    SetMonthlyIncomes(Vec<MonthlyIncome>),
    /// Empty the income archive.
    ClearMonthlyIncomes,
    /// Remove one income from an archive bucket.
    #[serde(rename_all = "camelCase")]
    DeleteMonthlyIncome {
        /// Bucket holding the income.
        month_key: MonthKey,
        /// Income to remove.
        income_id: IncomeId,
    },
    /// Remove a whole archive bucket.
    DeleteMonthlyBucket(MonthKey),
    /// Append a savings goal.
    AddSavingsGoal(SavingsGoal),
    /// Replace the savings goal with the same id.
    UpdateSavingsGoal(SavingsGoal),
    /// Remove a savings goal by id.
    DeleteSavingsGoal(SavingsGoalId),
    /// Record a contribution, completing the goal once its target is
    /// reached.
    #[serde(rename_all = "camelCase")]
    AddContribution {
        /// Goal the contribution is for.
        goal_id: SavingsGoalId,
        /// The contribution.
        contribution: Contribution,
    },
    /// Remove one contribution from a goal.
    #[serde(rename_all = "camelCase")]
    DeleteContribution {
        /// Goal holding the contribution.
        goal_id: SavingsGoalId,
        /// Contribution to remove.
        contribution_id: ContributionId,
    },
    /// Remove a completed saving record by id.
    DeleteCompletedSaving(SavingsGoalId),
    /// Remove every completed saving record.
    ClearCompletedSavings,
    /// Merge the present fields over the current state.
    LoadState(Box<PartialFinanceState>),
}

impl Action {
    /// Wire name of the action, e.g. `"ADD_PAYMENT"`.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match *self {
            Self::SetCurrency(_) => "SET_CURRENCY",
            Self::SetDarkMode(_) => "SET_DARK_MODE",
            Self::AddTransaction(_) => "ADD_TRANSACTION",
            Self::AddBudget(_) => "ADD_BUDGET",
            Self::UpdateBudget(_) => "UPDATE_BUDGET",
            Self::DeleteBudget(_) => "DELETE_BUDGET",
            Self::SetBudgets(_) => "SET_BUDGETS",
            Self::AddDebt(_) => "ADD_DEBT",
            Self::UpdateDebt(_) => "UPDATE_DEBT",
            Self::DeleteDebt { .. } => "DELETE_DEBT",
            Self::AddPayment { .. } => "ADD_PAYMENT",
            Self::AddCompletedDebt(_) => "ADD_COMPLETED_DEBT",
            Self::DeleteCompletedDebt(_) => "DELETE_COMPLETED_DEBT",
            Self::ClearCompletedDebts => "CLEAR_COMPLETED_DEBTS",
            Self::AddIncome(_) => "ADD_INCOME",
            Self::DeleteCurrentIncome(_) => "DELETE_CURRENT_INCOME",
            Self::SetCurrentMonthIncomes(_) => "SET_CURRENT_MONTH_INCOMES",
            Self::SetMonthlyIncomes(_) => "SET_MONTHLY_INCOMES",
            Self::ClearMonthlyIncomes => "CLEAR_MONTHLY_INCOMES",
            Self::DeleteMonthlyIncome { .. } => "DELETE_MONTHLY_INCOME",
            Self::DeleteMonthlyBucket(_) => "DELETE_MONTHLY_BUCKET",
            Self::AddSavingsGoal(_) => "ADD_SAVINGS_GOAL",
            Self::UpdateSavingsGoal(_) => "UPDATE_SAVINGS_GOAL",
            Self::DeleteSavingsGoal(_) => "DELETE_SAVINGS_GOAL",
            Self::AddContribution { .. } => "ADD_CONTRIBUTION",
            Self::DeleteContribution { .. } => "DELETE_CONTRIBUTION",
            Self::DeleteCompletedSaving(_) => "DELETE_COMPLETED_SAVING",
            Self::ClearCompletedSavings => "CLEAR_COMPLETED_SAVINGS",
            Self::LoadState(_) => "LOAD_STATE",
        }
    }
}

/// Computes the state that follows `state` after `action`.
///
/// Updates and deletes that name a missing entity leave the state as it
/// was.
#[must_use]
pub fn transition(state: &FinanceState, action: Action) -> FinanceState {
    let mut next = state.clone();
    match action {
        Action::SetCurrency(currency) => next.currency = currency,
        Action::SetDarkMode(enabled) => next.dark_mode = enabled,
        Action::AddTransaction(transaction) => next.transactions.push(transaction),
        Action::AddBudget(budget) => next.budgets.push(budget),
        Action::UpdateBudget(budget) => {
            for slot in next.budgets.iter_mut().filter(|b| b.id == budget.id) {
                slot.clone_from(&budget);
            }
        }
        Action::DeleteBudget(id) => next.budgets.retain(|b| b.id != id),
        Action::SetBudgets(budgets) => next.budgets = budgets,
        Action::AddDebt(debt) => next.debts.push(debt),
        Action::UpdateDebt(debt) => {
            for slot in next.debts.iter_mut().filter(|d| d.id == debt.id) {
                slot.clone_from(&debt);
            }
        }
        Action::DeleteDebt { id, date_cleared } => complete_debt(&mut next, &id, date_cleared),
        Action::AddPayment { debt_id, payment } => {
            let date = payment.date;
            let Some(debt) = next.debts.iter_mut().find(|d| d.id == debt_id) else {
                return next;
            };
            debt.payments.push(payment);
            if debt.is_paid_off() {
                complete_debt(&mut next, &debt_id, date);
            }
        }
        Action::AddCompletedDebt(completed) => next.completed_debts.push(completed),
        Action::DeleteCompletedDebt(id) => next.completed_debts.retain(|d| d.id != id),
        Action::ClearCompletedDebts => next.completed_debts.clear(),
        Action::AddIncome(income) => next.current_month_incomes.push(income),
        Action::DeleteCurrentIncome(id) => next.current_month_incomes.retain(|i| i.id != id),
        Action::SetCurrentMonthIncomes(incomes) => next.current_month_incomes = incomes,
        Action::SetMonthlyIncomes(buckets) => next.monthly_incomes = buckets,
        Action::ClearMonthlyIncomes => next.monthly_incomes.clear(),
        Action::DeleteMonthlyIncome {
            month_key,
            income_id,
        } => {
            for bucket in next
                .monthly_incomes
                .iter_mut()
                .filter(|bucket| bucket.month_key == month_key)
            {
                bucket.incomes.retain(|i| i.id != income_id);
                bucket.total_income = calc::total_income(&bucket.incomes);
            }
            next.monthly_incomes
                .retain(|bucket| !bucket.incomes.is_empty());
        }
        Action::DeleteMonthlyBucket(month_key) => next
            .monthly_incomes
            .retain(|bucket| bucket.month_key != month_key),
        Action::AddSavingsGoal(goal) => next.savings_goals.push(goal),
        Action::UpdateSavingsGoal(goal) => {
            for slot in next.savings_goals.iter_mut().filter(|g| g.id == goal.id) {
                slot.clone_from(&goal);
            }
        }
        Action::DeleteSavingsGoal(id) => next.savings_goals.retain(|g| g.id != id),
        Action::AddContribution {
            goal_id,
            contribution,
        } => {
            let date = contribution.date;
            let Some(goal) = next.savings_goals.iter_mut().find(|g| g.id == goal_id) else {
                return next;
            };
            goal.contributions.push(contribution);
            if goal.is_reached() {
                complete_saving(&mut next, &goal_id, date);
            }
        }
        Action::DeleteContribution {
            goal_id,
            contribution_id,
        } => {
            for goal in next.savings_goals.iter_mut().filter(|g| g.id == goal_id) {
                goal.contributions.retain(|c| c.id != contribution_id);
            }
        }
        Action::DeleteCompletedSaving(id) => next.completed_savings.retain(|s| s.id != id),
        Action::ClearCompletedSavings => next.completed_savings.clear(),
        Action::LoadState(partial) => partial.merge_into(&mut next),
    }
    next
}

/// Moves the debt with `id` into the completed list, snapshotting what was
/// paid. Does nothing if no such debt exists.
fn complete_debt(state: &mut FinanceState, id: &DebtId, date_cleared: NaiveDate) {
    let Some(completed) = state
        .debts
        .iter()
        .find(|d| d.id == *id)
        .map(|d| d.to_completed(date_cleared))
    else {
        return;
    };
    state.debts.retain(|d| d.id != *id);
    state.completed_debts.push(completed);
}

/// Moves the goal with `id` into the completed savings. A goal already
/// recorded as completed is not recorded twice.
fn complete_saving(state: &mut FinanceState, id: &SavingsGoalId, date_completed: NaiveDate) {
    let Some(completed) = state
        .savings_goals
        .iter()
        .find(|g| g.id == *id)
        .map(|g| g.to_completed(date_completed))
    else {
        return;
    };
    state.savings_goals.retain(|g| g.id != *id);
    if !state.completed_savings.iter().any(|s| s.id == *id) {
        state.completed_savings.push(completed);
    }
}

/// A serialized action as accepted by [`FinanceStore::dispatch_json`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireAction {
    /// Any action in its canonical shape.
    Canonical(Action),
    /// An action naming its target by a bare id.
    ById(IdOnlyAction),
}

/// Actions whose payload may be just the target id, with the remaining
/// fields filled in by the store.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "kind",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
enum IdOnlyAction {
    /// `DELETE_DEBT` with the debt id as payload; cleared today.
    DeleteDebt(DebtId),
}

/// Callback invoked with the new state after each dispatch.
type Listener = Box<dyn FnMut(&FinanceState) + Send>;

/// Owns the current [`FinanceState`] and persists it after every action.
///
/// # Example
///
/// ```rust
/// use fintrack::models::Currency;
/// use fintrack::storage::InMemoryStorage;
/// use fintrack::store::{Action, FinanceStore};
///
/// let mut store = FinanceStore::open(InMemoryStorage::new()).unwrap();
/// store.dispatch(Action::SetCurrency(Currency::new("EUR"))).unwrap();
/// assert_eq!(store.state().currency.code(), "EUR");
/// ```
pub struct FinanceStore<S: StateStorage> {
    /// Current state.
    state: FinanceState,
    /// Persistence backend.
    storage: S,
    /// Subscribers notified after each dispatch.
    listeners: Vec<Listener>,
}

impl<S: StateStorage> fmt::Debug for FinanceStore<S> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinanceStore")
            .field("state", &self.state)
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<S: StateStorage> FinanceStore<S> {
    /// Opens a store, loading any state previously saved in `storage`.
    ///
    /// With nothing saved the store starts from [`FinanceState::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails or the saved state is
    /// not valid JSON of the expected shape.
    #[tracing::instrument(skip_all)]
    pub fn open(storage: S) -> Result<Self> {
        let state = match storage.read(STATE_KEY)? {
            Some(raw) => {
                tracing::trace!(bytes = raw.len(), "loading saved state");
                let partial: PartialFinanceState = serde_json::from_str(&raw)?;
                transition(
                    &FinanceState::default(),
                    Action::LoadState(Box::new(partial)),
                )
            }
            None => {
                tracing::debug!("no saved state, starting fresh");
                FinanceState::default()
            }
        };
        Ok(Self::with_state(storage, state))
    }

    /// Like [`Self::open`], but starts from defaults when the saved state
    /// cannot be decoded.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage read itself fails.
    #[tracing::instrument(skip_all)]
    pub fn open_or_default(storage: S) -> Result<Self> {
        let state = match storage.read(STATE_KEY)? {
            Some(raw) => match serde_json::from_str::<PartialFinanceState>(&raw) {
                Ok(partial) => transition(
                    &FinanceState::default(),
                    Action::LoadState(Box::new(partial)),
                ),
                Err(err) => {
                    tracing::warn!(error = %err, "saved state is corrupt, starting fresh");
                    FinanceState::default()
                }
            },
            None => FinanceState::default(),
        };
        Ok(Self::with_state(storage, state))
    }

    /// Creates a store around an explicit state without reading storage.
    #[inline]
    #[must_use]
    pub fn with_state(storage: S, state: FinanceState) -> Self {
        Self {
            state,
            storage,
            listeners: Vec::new(),
        }
    }

    /// The current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &FinanceState {
        &self.state
    }

    /// The persistence backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Registers a callback that receives every new state.
    #[inline]
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&FinanceState) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Applies an action, notifies subscribers and persists the result.
    ///
    /// # Errors
    ///
    /// Returns an error if serializing or writing the new state fails. The
    /// in-memory state has already advanced when that happens.
    #[tracing::instrument(skip_all, fields(kind = action.kind()))]
    pub fn dispatch(&mut self, action: Action) -> Result<&FinanceState> {
        tracing::debug!("dispatching action");
        self.state = transition(&self.state, action);
        let persisted = self.persist();
        for listener in &mut self.listeners {
            listener(&self.state);
        }
        persisted?;
        Ok(&self.state)
    }

    /// Decodes and dispatches a serialized action.
    ///
    /// `DELETE_DEBT` may carry either `{id, dateCleared}` or the bare debt
    /// id, in which case the debt is cleared today. An unknown kind or a
    /// payload that does not decode leaves the state untouched and is only
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns an error if a decoded action fails to persist.
    #[tracing::instrument(skip_all)]
    pub fn dispatch_json(&mut self, raw: &str) -> Result<&FinanceState> {
        match serde_json::from_str::<WireAction>(raw) {
            Ok(WireAction::Canonical(action)) => self.dispatch(action),
            Ok(WireAction::ById(IdOnlyAction::DeleteDebt(id))) => self.delete_debt(&id),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unrecognized action");
                Ok(&self.state)
            }
        }
    }

    /// Records a payment on a debt dated `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[inline]
    pub fn add_payment(
        &mut self,
        debt_id: &DebtId,
        amount: f64,
        date: NaiveDate,
    ) -> Result<&FinanceState> {
        self.dispatch(Action::AddPayment {
            debt_id: debt_id.clone(),
            payment: Payment::new(amount, date),
        })
    }

    /// Files an income: incomes dated in the month of `today` go to the
    /// current month, anything else into the monthly archive.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[inline]
    pub fn record_income(&mut self, income: Income, today: NaiveDate) -> Result<&FinanceState> {
        let action = if calc::is_same_month(income.date, today) {
            Action::AddIncome(income)
        } else {
            Action::SetMonthlyIncomes(calc::archive_income(&self.state.monthly_incomes, income))
        };
        self.dispatch(action)
    }

    /// Records a contribution towards a savings goal dated `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[inline]
    pub fn add_contribution(
        &mut self,
        goal_id: &SavingsGoalId,
        amount: f64,
        date: NaiveDate,
    ) -> Result<&FinanceState> {
        self.dispatch(Action::AddContribution {
            goal_id: goal_id.clone(),
            contribution: Contribution::new(amount, date),
        })
    }

    /// Removes a debt, recording it as completed today.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    #[inline]
    pub fn delete_debt(&mut self, id: &DebtId) -> Result<&FinanceState> {
        self.dispatch(Action::DeleteDebt {
            id: id.clone(),
            date_cleared: calc::today(),
        })
    }

    /// Serializes the current state into the storage slot.
    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.state)?;
        tracing::trace!(bytes = json.len(), "persisting state");
        self.storage.write(STATE_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::FinanceError;
    use crate::models::{Classification, InterestType, NewDebt, SubCategory};
    use crate::storage::InMemoryStorage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(total: f64) -> Debt {
        NewDebt {
            name: "Loan".to_owned(),
            principal: total,
            interest_rate: 0.0,
            interest_type: InterestType::Monthly,
            months: 10.0,
            minimum_payment: 50.0,
        }
        .build(date(2024, 1, 1))
    }

    fn rent_budget() -> Budget {
        Budget::new(
            "Housing",
            Classification::Needs,
            vec![SubCategory::new("Rent", 1200.0)],
        )
    }

    fn memory_store() -> FinanceStore<InMemoryStorage> {
        FinanceStore::open(InMemoryStorage::new()).unwrap()
    }

    #[test]
    fn default_state() {
        let state = FinanceState::default();
        assert!(state.budgets.is_empty());
        assert!(state.monthly_incomes.is_empty());
        assert_eq!(state.currency.code(), "USD");
        assert!(!state.dark_mode);
    }

    #[test]
    fn transition_leaves_prior_state_untouched() {
        let before = FinanceState::default();
        let after = transition(&before, Action::AddBudget(rent_budget()));
        assert!(before.budgets.is_empty());
        assert_eq!(after.budgets.len(), 1);
    }

    #[test]
    fn delete_budget_is_idempotent() {
        let budget = rent_budget();
        let id = budget.id.clone();
        let start = transition(&FinanceState::default(), Action::AddBudget(budget));
        let once = transition(&start, Action::DeleteBudget(id.clone()));
        let twice = transition(&once, Action::DeleteBudget(id));
        assert!(once.budgets.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn update_unknown_ids_is_noop() {
        let start = transition(&FinanceState::default(), Action::AddBudget(rent_budget()));
        let stranger = rent_budget();
        assert_eq!(transition(&start, Action::UpdateBudget(stranger)), start);
        assert_eq!(transition(&start, Action::UpdateDebt(loan(10.0))), start);
    }

    #[test]
    fn update_budget_replaces_by_id() {
        let mut budget = rent_budget();
        let start = transition(&FinanceState::default(), Action::AddBudget(budget.clone()));
        budget.category = "Home".to_owned();
        let next = transition(&start, Action::UpdateBudget(budget));
        assert_eq!(next.budgets[0].category, "Home");
    }

    #[test]
    fn update_debt_keeps_payload_total() {
        let mut debt = loan(1000.0);
        let start = transition(&FinanceState::default(), Action::AddDebt(debt.clone()));
        debt.principal = 2000.0;
        let next = transition(&start, Action::UpdateDebt(debt));
        assert!((next.debts[0].principal - 2000.0).abs() < f64::EPSILON);
        assert!((next.debts[0].total_amount - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn delete_debt_snapshots_payments() {
        let mut debt = loan(1000.0);
        debt.payments.push(Payment::new(300.0, date(2024, 2, 1)));
        let id = debt.id.clone();
        let start = transition(&FinanceState::default(), Action::AddDebt(debt));
        let next = transition(
            &start,
            Action::DeleteDebt {
                id,
                date_cleared: date(2024, 3, 1),
            },
        );
        assert!(next.debts.is_empty());
        assert_eq!(next.completed_debts.len(), 1);
        assert!((next.completed_debts[0].amount_paid - 300.0).abs() < f64::EPSILON);
        assert_eq!(next.completed_debts[0].date_cleared, date(2024, 3, 1));
    }

    #[test]
    fn delete_missing_debt_adds_nothing() {
        let next = transition(
            &FinanceState::default(),
            Action::DeleteDebt {
                id: DebtId::from("ghost"),
                date_cleared: date(2024, 3, 1),
            },
        );
        assert!(next.completed_debts.is_empty());
    }

    #[test]
    fn payments_complete_debt_once_paid_off() {
        let debt = loan(100.0);
        let id = debt.id.clone();
        let mut state = transition(&FinanceState::default(), Action::AddDebt(debt));
        state = transition(
            &state,
            Action::AddPayment {
                debt_id: id.clone(),
                payment: Payment::new(60.0, date(2024, 2, 1)),
            },
        );
        assert_eq!(state.debts.len(), 1);
        assert!(state.completed_debts.is_empty());

        state = transition(
            &state,
            Action::AddPayment {
                debt_id: id.clone(),
                payment: Payment::new(40.0, date(2024, 3, 5)),
            },
        );
        assert!(state.debts.is_empty());
        assert_eq!(state.completed_debts.len(), 1);
        let completed = &state.completed_debts[0];
        assert_eq!(completed.id, id);
        assert!((completed.amount_paid - 100.0).abs() < f64::EPSILON);
        assert_eq!(completed.date_cleared, date(2024, 3, 5));
    }

    #[test]
    fn overpayment_completes_debt_with_full_sum() {
        let debt = loan(100.0);
        let id = debt.id.clone();
        let mut state = transition(&FinanceState::default(), Action::AddDebt(debt));
        for (amount, day) in [(60.0, 1), (70.0, 2)] {
            state = transition(
                &state,
                Action::AddPayment {
                    debt_id: id.clone(),
                    payment: Payment::new(amount, date(2024, 2, day)),
                },
            );
        }
        assert!(state.debts.is_empty());
        assert_eq!(state.completed_debts.len(), 1);
        assert!((state.completed_debts[0].amount_paid - 130.0).abs() < f64::EPSILON);
        assert_eq!(state.completed_debts[0].date_cleared, date(2024, 2, 2));
    }

    #[test]
    fn any_payment_completes_zero_total_debt() {
        let debt = loan(0.0);
        let id = debt.id.clone();
        let start = transition(&FinanceState::default(), Action::AddDebt(debt));
        let next = transition(
            &start,
            Action::AddPayment {
                debt_id: id,
                payment: Payment::new(5.0, date(2024, 2, 1)),
            },
        );
        assert!(next.debts.is_empty());
        assert!((next.completed_debts[0].amount_paid - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn payment_for_unknown_debt_is_noop() {
        let start = transition(&FinanceState::default(), Action::AddDebt(loan(100.0)));
        let next = transition(
            &start,
            Action::AddPayment {
                debt_id: DebtId::from("ghost"),
                payment: Payment::new(500.0, date(2024, 2, 1)),
            },
        );
        assert_eq!(next, start);
    }

    #[test]
    fn completed_debt_list_actions() {
        let completed = loan(10.0).to_completed(date(2024, 5, 1));
        let id = completed.id.clone();
        let mut state = transition(
            &FinanceState::default(),
            Action::AddCompletedDebt(completed.clone()),
        );
        state = transition(&state, Action::AddCompletedDebt(completed));
        assert_eq!(state.completed_debts.len(), 2);
        let removed = transition(&state, Action::DeleteCompletedDebt(id));
        assert!(removed.completed_debts.is_empty());
        let cleared = transition(&state, Action::ClearCompletedDebts);
        assert!(cleared.completed_debts.is_empty());
    }

    #[test]
    fn deleting_last_archived_income_drops_bucket() {
        let keep = Income::new("Gig", 30.0, date(2024, 2, 1));
        let drop_me = Income::new("Salary", 100.0, date(2024, 1, 15));
        let other = Income::new("Bonus", 50.0, date(2024, 1, 20));
        let buckets =
            calc::organize_income_by_month(&[drop_me.clone(), other.clone(), keep.clone()]);
        let mut state = transition(&FinanceState::default(), Action::SetMonthlyIncomes(buckets));
        let january = MonthKey::of(date(2024, 1, 1));

        state = transition(
            &state,
            Action::DeleteMonthlyIncome {
                month_key: january,
                income_id: drop_me.id,
            },
        );
        assert_eq!(state.monthly_incomes.len(), 2);
        assert!((state.monthly_incomes[1].total_income - 50.0).abs() < f64::EPSILON);

        state = transition(
            &state,
            Action::DeleteMonthlyIncome {
                month_key: january,
                income_id: other.id,
            },
        );
        assert_eq!(state.monthly_incomes.len(), 1);
        assert_eq!(state.monthly_incomes[0].incomes[0].id, keep.id);
    }

    #[test]
    fn delete_monthly_bucket_and_clear() {
        let buckets = calc::organize_income_by_month(&[
            Income::new("A", 1.0, date(2024, 1, 1)),
            Income::new("B", 2.0, date(2024, 2, 1)),
        ]);
        let state = transition(&FinanceState::default(), Action::SetMonthlyIncomes(buckets));
        let next = transition(
            &state,
            Action::DeleteMonthlyBucket(MonthKey::of(date(2024, 2, 1))),
        );
        assert_eq!(next.monthly_incomes.len(), 1);
        assert_eq!(next.monthly_incomes[0].month_key.to_string(), "2024-0");
        assert!(transition(&next, Action::ClearMonthlyIncomes)
            .monthly_incomes
            .is_empty());
    }

    #[test]
    fn current_month_income_actions() {
        let income = Income::new("Salary", 3000.0, date(2024, 4, 1));
        let id = income.id.clone();
        let state = transition(&FinanceState::default(), Action::AddIncome(income));
        assert_eq!(state.current_month_incomes.len(), 1);
        let removed = transition(&state, Action::DeleteCurrentIncome(id));
        assert!(removed.current_month_incomes.is_empty());
        let replaced = transition(&state, Action::SetCurrentMonthIncomes(Vec::new()));
        assert!(replaced.current_month_incomes.is_empty());
    }

    #[test]
    fn savings_actions() {
        let goal = SavingsGoal::new("Trip", 500.0, date(2024, 1, 1), date(2024, 6, 1));
        let id = goal.id.clone();
        let mut state = transition(&FinanceState::default(), Action::AddSavingsGoal(goal.clone()));
        state = transition(
            &state,
            Action::AddContribution {
                goal_id: id.clone(),
                contribution: Contribution::new(120.0, date(2024, 2, 1)),
            },
        );
        assert!((state.savings_goals[0].remaining() - 380.0).abs() < f64::EPSILON);

        let mut renamed = state.savings_goals[0].clone();
        renamed.goal = "Holiday".to_owned();
        state = transition(&state, Action::UpdateSavingsGoal(renamed));
        assert_eq!(state.savings_goals[0].goal, "Holiday");
        assert_eq!(state.savings_goals[0].contributions.len(), 1);

        let ghost = transition(
            &state,
            Action::AddContribution {
                goal_id: SavingsGoalId::from("ghost"),
                contribution: Contribution::new(1.0, date(2024, 2, 2)),
            },
        );
        assert_eq!(ghost, state);

        state = transition(&state, Action::DeleteSavingsGoal(id));
        assert!(state.savings_goals.is_empty());
    }

    #[test]
    fn contribution_reaching_target_completes_goal() {
        let goal = SavingsGoal::new("Laptop", 1000.0, date(2024, 1, 1), date(2024, 12, 1));
        let id = goal.id.clone();
        let mut state = transition(&FinanceState::default(), Action::AddSavingsGoal(goal));
        for (amount, month) in [(600.0, 2), (450.0, 3)] {
            state = transition(
                &state,
                Action::AddContribution {
                    goal_id: id.clone(),
                    contribution: Contribution::new(amount, date(2024, month, 10)),
                },
            );
        }
        assert!(state.savings_goals.is_empty());
        assert_eq!(state.completed_savings.len(), 1);
        let done = &state.completed_savings[0];
        assert_eq!(done.id, id);
        assert_eq!(done.goal, "Laptop");
        assert!((done.target_amount - 1000.0).abs() < f64::EPSILON);
        assert_eq!(done.date_completed, date(2024, 3, 10));
    }

    #[test]
    fn completed_saving_recorded_once() {
        let goal = SavingsGoal::new("Trip", 100.0, date(2024, 1, 1), date(2024, 6, 1));
        let id = goal.id.clone();
        let mut state = FinanceState {
            completed_savings: vec![goal.to_completed(date(2023, 12, 1))],
            ..FinanceState::default()
        };
        state = transition(&state, Action::AddSavingsGoal(goal));
        state = transition(
            &state,
            Action::AddContribution {
                goal_id: id,
                contribution: Contribution::new(100.0, date(2024, 2, 1)),
            },
        );
        assert!(state.savings_goals.is_empty());
        assert_eq!(state.completed_savings.len(), 1);
        assert_eq!(state.completed_savings[0].date_completed, date(2023, 12, 1));
    }

    #[test]
    fn delete_contribution_by_id() {
        let mut goal = SavingsGoal::new("Trip", 500.0, date(2024, 1, 1), date(2024, 6, 1));
        let first = Contribution::new(100.0, date(2024, 2, 1));
        let second = Contribution::new(50.0, date(2024, 3, 1));
        let first_id = first.id.clone();
        goal.contributions = vec![first, second];
        let goal_id = goal.id.clone();
        let state = transition(&FinanceState::default(), Action::AddSavingsGoal(goal));

        let next = transition(
            &state,
            Action::DeleteContribution {
                goal_id: goal_id.clone(),
                contribution_id: first_id.clone(),
            },
        );
        assert_eq!(next.savings_goals[0].contributions.len(), 1);
        assert!((next.savings_goals[0].total_contributed() - 50.0).abs() < f64::EPSILON);

        let ghost = transition(
            &state,
            Action::DeleteContribution {
                goal_id: SavingsGoalId::from("ghost"),
                contribution_id: first_id,
            },
        );
        assert_eq!(ghost, state);
    }

    #[test]
    fn completed_savings_list_actions() {
        let first = SavingsGoal::new("A", 1.0, date(2024, 1, 1), date(2024, 2, 1));
        let second = SavingsGoal::new("B", 2.0, date(2024, 1, 1), date(2024, 2, 1));
        let first_id = first.id.clone();
        let state = FinanceState {
            completed_savings: vec![
                first.to_completed(date(2024, 1, 5)),
                second.to_completed(date(2024, 1, 6)),
            ],
            ..FinanceState::default()
        };
        let removed = transition(&state, Action::DeleteCompletedSaving(first_id));
        assert_eq!(removed.completed_savings.len(), 1);
        assert_eq!(removed.completed_savings[0].goal, "B");
        let cleared = transition(&state, Action::ClearCompletedSavings);
        assert!(cleared.completed_savings.is_empty());
        assert_eq!(Action::ClearCompletedSavings.kind(), "CLEAR_COMPLETED_SAVINGS");
    }

    #[test]
    fn load_state_merges_present_fields() {
        let mut start = transition(&FinanceState::default(), Action::AddBudget(rent_budget()));
        start.dark_mode = true;
        let partial = PartialFinanceState {
            currency: Some(Currency::new("EUR")),
            ..PartialFinanceState::default()
        };
        let next = transition(&start, Action::LoadState(Box::new(partial)));
        assert_eq!(next.currency.code(), "EUR");
        assert!(next.dark_mode);
        assert_eq!(next.budgets, start.budgets);
    }

    #[test]
    fn action_wire_format() {
        let json = serde_json::to_value(Action::DeleteDebt {
            id: DebtId::from("debt-1"),
            date_cleared: date(2024, 3, 1),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "DELETE_DEBT",
                "payload": {"id": "debt-1", "dateCleared": "2024-03-01"}
            })
        );
        let clear: Action = serde_json::from_str(r#"{"kind":"CLEAR_COMPLETED_DEBTS"}"#).unwrap();
        assert_eq!(clear, Action::ClearCompletedDebts);
        assert_eq!(clear.kind(), "CLEAR_COMPLETED_DEBTS");
        let dark: Action = serde_json::from_str(r#"{"kind":"SET_DARK_MODE","payload":true}"#).unwrap();
        assert_eq!(dark, Action::SetDarkMode(true));
    }

    #[test]
    fn dispatch_persists_every_action() {
        let mut store = memory_store();
        let _state = store.dispatch(Action::SetDarkMode(true)).unwrap();
        let _state = store.dispatch(Action::AddBudget(rent_budget())).unwrap();
        assert_eq!(store.storage().write_count().unwrap(), 2);
        let raw = store.storage().read(STATE_KEY).unwrap().unwrap();
        let saved: FinanceState = serde_json::from_str(&raw).unwrap();
        assert_eq!(&saved, store.state());
    }

    #[test]
    fn dispatch_json_ignores_unknown_kinds() {
        let mut store = memory_store();
        let before = store.state().clone();
        let _state = store
            .dispatch_json(r#"{"kind":"UPDATE_SAVINGS","payload":{}}"#)
            .unwrap();
        let _state = store.dispatch_json("not json at all").unwrap();
        assert_eq!(store.state(), &before);
        assert_eq!(store.storage().write_count().unwrap(), 0);

        let _state = store
            .dispatch_json(r#"{"kind":"SET_CURRENCY","payload":"GBP"}"#)
            .unwrap();
        assert_eq!(store.state().currency.code(), "GBP");
        assert_eq!(store.storage().write_count().unwrap(), 1);
    }

    #[test]
    fn dispatch_json_accepts_bare_debt_id() {
        let mut store = memory_store();
        let mut debt = loan(400.0);
        debt.payments.push(Payment::new(25.0, date(2024, 2, 1)));
        let id = debt.id.clone();
        let _state = store.dispatch(Action::AddDebt(debt)).unwrap();

        let raw = format!(r#"{{"kind":"DELETE_DEBT","payload":"{id}"}}"#);
        let _state = store.dispatch_json(&raw).unwrap();
        assert!(store.state().debts.is_empty());
        let completed = &store.state().completed_debts[0];
        assert_eq!(completed.id, id);
        assert!((completed.amount_paid - 25.0).abs() < f64::EPSILON);
        assert_eq!(completed.date_cleared, calc::today());
        assert_eq!(store.storage().write_count().unwrap(), 2);
    }

    #[test]
    fn dispatch_json_accepts_dated_delete_debt() {
        let mut store = memory_store();
        let debt = loan(400.0);
        let id = debt.id.clone();
        let _state = store.dispatch(Action::AddDebt(debt)).unwrap();
        let raw = format!(
            r#"{{"kind":"DELETE_DEBT","payload":{{"id":"{id}","dateCleared":"2024-04-02"}}}}"#
        );
        let _state = store.dispatch_json(&raw).unwrap();
        assert_eq!(store.state().completed_debts[0].date_cleared, date(2024, 4, 2));
    }

    #[test]
    fn open_loads_fractional_debt_terms() {
        let saved = r#"{"debts":[{
            "id": "debt-1",
            "name": "Sofa",
            "principal": 1000,
            "interestRate": 12,
            "interestType": "annual",
            "months": 6.5,
            "totalAmount": 1065,
            "minimumPayment": 50,
            "payments": [],
            "dateAdded": "2024-01-01"
        }]}"#;
        let store = FinanceStore::open(InMemoryStorage::with_value(STATE_KEY, saved)).unwrap();
        let debt = &store.state().debts[0];
        assert!((debt.months - 6.5).abs() < f64::EPSILON);
        assert!((debt.total_amount - 1065.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_round_trips_through_storage() {
        let mut store = memory_store();
        let debt = loan(500.0);
        let debt_id = debt.id.clone();
        let _state = store.dispatch(Action::AddDebt(debt)).unwrap();
        let _state = store.add_payment(&debt_id, 100.0, date(2024, 2, 1)).unwrap();
        let _state = store.dispatch(Action::SetCurrency(Currency::new("JPY"))).unwrap();
        let goal = SavingsGoal::new("Fund", 10.0, date(2024, 1, 1), date(2024, 2, 1));
        let goal_id = goal.id.clone();
        let _state = store.dispatch(Action::AddSavingsGoal(goal)).unwrap();
        let _state = store.add_contribution(&goal_id, 10.0, date(2024, 1, 9)).unwrap();
        assert_eq!(store.state().completed_savings.len(), 1);
        let expected = store.state().clone();

        let raw = store.storage().read(STATE_KEY).unwrap().unwrap();
        let reopened = FinanceStore::open(InMemoryStorage::with_value(STATE_KEY, &raw)).unwrap();
        assert_eq!(reopened.state(), &expected);
    }

    #[test]
    fn open_merges_partial_saved_state() {
        let storage = InMemoryStorage::with_value(STATE_KEY, r#"{"darkMode":true}"#);
        let store = FinanceStore::open(storage).unwrap();
        assert!(store.state().dark_mode);
        assert_eq!(store.state().currency.code(), "USD");
        assert!(store.state().debts.is_empty());
    }

    #[test]
    fn open_fails_on_corrupt_state() {
        let storage = InMemoryStorage::with_value(STATE_KEY, "{not json");
        let err = FinanceStore::open(storage).unwrap_err();
        assert!(matches!(err, FinanceError::Serialization(_)));
    }

    #[test]
    fn open_or_default_recovers_from_corrupt_state() {
        let storage = InMemoryStorage::with_value(STATE_KEY, r#"{"budgets": 42}"#);
        let store = FinanceStore::open_or_default(storage).unwrap();
        assert_eq!(store.state(), &FinanceState::default());
    }

    #[test]
    fn listeners_see_each_new_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut store = memory_store();
        store.subscribe(move |state| sink.lock().unwrap().push(state.dark_mode));
        let _state = store.dispatch(Action::SetDarkMode(true)).unwrap();
        let _state = store.dispatch(Action::SetDarkMode(false)).unwrap();
        assert_eq!(*seen.lock().unwrap(), [true, false]);
    }

    #[test]
    fn record_income_routes_by_month() {
        let mut store = memory_store();
        let today = date(2024, 5, 20);
        let _state = store
            .record_income(Income::new("Salary", 3000.0, date(2024, 5, 1)), today)
            .unwrap();
        let _state = store
            .record_income(Income::new("Old gig", 200.0, date(2024, 3, 9)), today)
            .unwrap();
        let _state = store
            .record_income(Income::new("Older gig", 50.0, date(2024, 3, 2)), today)
            .unwrap();
        let state = store.state();
        assert_eq!(state.current_month_incomes.len(), 1);
        assert_eq!(state.monthly_incomes.len(), 1);
        assert!((state.monthly_incomes[0].total_income - 250.0).abs() < f64::EPSILON);
        assert_eq!(state.monthly_incomes[0].month_name, "March 2024");
    }

    #[test]
    fn delete_debt_helper_completes_debt() {
        let mut store = memory_store();
        let debt = loan(100.0);
        let id = debt.id.clone();
        let _state = store.dispatch(Action::AddDebt(debt)).unwrap();
        let _state = store.delete_debt(&id).unwrap();
        assert!(store.state().debts.is_empty());
        assert_eq!(store.state().completed_debts[0].date_cleared, calc::today());
    }

    #[test]
    fn debug_does_not_require_listener_debug() {
        let mut store = memory_store();
        store.subscribe(|_state| {});
        let rendered = format!("{store:?}");
        assert!(rendered.contains("FinanceStore"));
        assert!(rendered.contains("listeners: 1"));
    }
}
