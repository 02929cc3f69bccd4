//! Edit buffers for debts and budgets.
//!
//! A draft copies an entity, accepts edits without touching the store, and
//! produces a single update [`Action`] on commit. Dropping a draft discards
//! its edits.

use crate::calc;
use crate::models::{Budget, Classification, Debt, Payment, PaymentId, SubCategory};
use crate::store::Action;

/// One reversible edit in a [`PaymentDraft`].
#[derive(Debug, Clone, PartialEq)]
enum PaymentEdit {
    /// A payment was removed.
    Delete(Payment),
    /// A payment's amount changed; holds the payment as it was before.
    Modify(Payment),
}

/// Buffered edits to a debt's payment history, with undo.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    /// The debt as it was when the draft was opened.
    debt: Debt,
    /// Working copy of the payments.
    payments: Vec<Payment>,
    /// Undo log, most recent last.
    history: Vec<PaymentEdit>,
    /// Payment whose amount is being edited, with its amount at the start
    /// of the edit.
    editing: Option<Payment>,
}

impl PaymentDraft {
    /// Opens a draft over a copy of the debt's payments.
    #[inline]
    #[must_use]
    pub fn new(debt: &Debt) -> Self {
        Self {
            debt: debt.clone(),
            payments: debt.payments.clone(),
            history: Vec::new(),
            editing: None,
        }
    }

    /// Payments in the working copy.
    #[inline]
    #[must_use]
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Sum of the working payments.
    #[inline]
    #[must_use]
    pub fn total_paid(&self) -> f64 {
        calc::total_paid(&self.payments)
    }

    /// Projected total minus the working payments.
    #[inline]
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.debt.total_amount - self.total_paid()
    }

    /// Share of the projected total covered by the working payments.
    #[inline]
    #[must_use]
    pub fn percentage_paid(&self) -> f64 {
        calc::percentage(self.total_paid(), self.debt.total_amount)
    }

    /// Whether the working payments differ from the debt's.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.payments != self.debt.payments
    }

    /// Whether there is an edit to undo.
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Removes a payment. Returns `false` if no payment has that id.
    #[inline]
    pub fn delete(&mut self, id: &PaymentId) -> bool {
        let Some(position) = self.payments.iter().position(|p| p.id == *id) else {
            return false;
        };
        let removed = self.payments.remove(position);
        if self.editing.as_ref().is_some_and(|p| p.id == *id) {
            self.editing = None;
        }
        self.history.push(PaymentEdit::Delete(removed));
        true
    }

    /// Starts editing a payment's amount, remembering the current value.
    ///
    /// Finishes any edit already in progress first.
    #[inline]
    pub fn begin_amount_edit(&mut self, id: &PaymentId) -> bool {
        let _changed = self.finish_amount_edit();
        match self.payments.iter().find(|p| p.id == *id) {
            Some(payment) => {
                self.editing = Some(payment.clone());
                true
            }
            None => false,
        }
    }

    /// Sets a payment's amount in the working copy.
    #[inline]
    pub fn set_amount(&mut self, id: &PaymentId, amount: f64) -> bool {
        match self.payments.iter_mut().find(|p| p.id == *id) {
            Some(payment) => {
                payment.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Ends the current amount edit.
    ///
    /// An undo entry is recorded only if the amount actually changed.
    /// Returns whether one was recorded.
    #[inline]
    pub fn finish_amount_edit(&mut self) -> bool {
        let Some(before) = self.editing.take() else {
            return false;
        };
        let changed = self
            .payments
            .iter()
            .find(|p| p.id == before.id)
            .is_some_and(|p| p.amount.total_cmp(&before.amount).is_ne());
        if changed {
            self.history.push(PaymentEdit::Modify(before));
        }
        changed
    }

    /// Reverts the most recent edit.
    ///
    /// An undone delete puts the payment back at the end of the list.
    #[inline]
    pub fn undo(&mut self) -> bool {
        let _changed = self.finish_amount_edit();
        match self.history.pop() {
            Some(PaymentEdit::Delete(payment)) => {
                self.payments.push(payment);
                true
            }
            Some(PaymentEdit::Modify(before)) => {
                if let Some(payment) = self.payments.iter_mut().find(|p| p.id == before.id) {
                    payment.amount = before.amount;
                }
                true
            }
            None => false,
        }
    }

    /// Builds the update for the store from the working payments.
    #[inline]
    #[must_use]
    pub fn commit(mut self) -> Action {
        let _changed = self.finish_amount_edit();
        let mut debt = self.debt;
        debt.payments = self.payments;
        Action::UpdateDebt(debt)
    }

    /// Throws the edits away, returning the untouched debt.
    #[inline]
    #[must_use]
    pub fn discard(self) -> Debt {
        self.debt
    }
}

/// Buffered edits to a budget category.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    /// The budget as it was when the draft was opened.
    original: Budget,
    /// Working copy.
    edited: Budget,
}

impl BudgetDraft {
    /// Opens a draft over a copy of the budget.
    #[inline]
    #[must_use]
    pub fn new(budget: &Budget) -> Self {
        Self {
            original: budget.clone(),
            edited: budget.clone(),
        }
    }

    /// The working copy.
    #[inline]
    #[must_use]
    pub const fn budget(&self) -> &Budget {
        &self.edited
    }

    /// Total of the working copy.
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        calc::category_total(&self.edited)
    }

    /// Whether the working copy differs from the original.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.edited != self.original
    }

    /// Renames the category.
    #[inline]
    pub fn set_category<C: Into<String>>(&mut self, category: C) {
        self.edited.category = category.into();
    }

    /// Moves the budget to another classification.
    #[inline]
    pub const fn set_classification(&mut self, classification: Classification) {
        self.edited.classification = classification;
    }

    /// Renames the subcategory at `index`.
    #[inline]
    pub fn rename_sub_category<N: Into<String>>(&mut self, index: usize, name: N) -> bool {
        match self.edited.sub_categories.get_mut(index) {
            Some(sub) => {
                sub.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Changes the amount allocated to the subcategory at `index`.
    #[inline]
    pub fn set_sub_category_amount(&mut self, index: usize, amount: f64) -> bool {
        match self.edited.sub_categories.get_mut(index) {
            Some(sub) => {
                sub.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Index of the subcategory with the given name.
    #[inline]
    #[must_use]
    pub fn find_sub_category(&self, name: &str) -> Option<usize> {
        self.edited
            .sub_categories
            .iter()
            .position(|sub| sub.name == name)
    }

    /// Appends a subcategory.
    #[inline]
    pub fn add_sub_category(&mut self, sub: SubCategory) {
        self.edited.sub_categories.push(sub);
    }

    /// Removes and returns the subcategory at `index`.
    #[inline]
    pub fn remove_sub_category(&mut self, index: usize) -> Option<SubCategory> {
        (index < self.edited.sub_categories.len())
            .then(|| self.edited.sub_categories.remove(index))
    }

    /// Drops all edits, going back to the original budget.
    #[inline]
    pub fn reset(&mut self) {
        self.edited.clone_from(&self.original);
    }

    /// Builds the update for the store from the working copy.
    #[inline]
    #[must_use]
    pub fn commit(self) -> Action {
        Action::UpdateBudget(self.edited)
    }
}
