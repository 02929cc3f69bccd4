//! Savings goal, contribution, and completed-saving models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ContributionId, SavingsGoalId};

/// Money put towards a savings goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Unique identifier.
    pub id: ContributionId,
    /// Amount contributed.
    pub amount: f64,
    /// Calendar date of the contribution.
    pub date: NaiveDate,
}

impl Contribution {
    /// Builds a contribution with a freshly generated identifier.
    #[inline]
    #[must_use]
    pub fn new(amount: f64, date: NaiveDate) -> Self {
        Self {
            id: ContributionId::random(),
            amount,
            date,
        }
    }
}

/// A savings target with its contribution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// Unique identifier.
    pub id: SavingsGoalId,
    /// Goal label.
    pub goal: String,
    /// Amount to reach.
    pub target_amount: f64,
    /// Date saving starts.
    pub start_date: NaiveDate,
    /// Date the target should be reached by.
    pub end_date: NaiveDate,
    /// Contributions made so far.
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl SavingsGoal {
    /// Builds a goal with no contributions and a fresh identifier.
    #[inline]
    #[must_use]
    pub fn new<G: Into<String>>(
        goal: G,
        target_amount: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: SavingsGoalId::random(),
            goal: goal.into(),
            target_amount,
            start_date,
            end_date,
            contributions: Vec::new(),
        }
    }

    /// Sum of all contributions.
    #[inline]
    #[must_use]
    pub fn total_contributed(&self) -> f64 {
        crate::calc::total_contributed(&self.contributions)
    }

    /// Amount still to save; negative once the target is exceeded.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> f64 {
        crate::calc::savings_remaining(self)
    }

    /// Whether the contributions reach the target.
    #[inline]
    #[must_use]
    pub fn is_reached(&self) -> bool {
        self.total_contributed() >= self.target_amount
    }

    /// Snapshots this goal as completed on the given date.
    #[inline]
    #[must_use]
    pub fn to_completed(&self, date_completed: NaiveDate) -> CompletedSaving {
        CompletedSaving {
            id: self.id.clone(),
            goal: self.goal.clone(),
            target_amount: self.target_amount,
            date_completed,
        }
    }
}

/// Record of a savings goal whose target was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSaving {
    /// Identifier of the goal.
    pub id: SavingsGoalId,
    /// Goal label.
    pub goal: String,
    /// Target that was reached.
    pub target_amount: f64,
    /// Date of the contribution that reached the target.
    pub date_completed: NaiveDate,
}
