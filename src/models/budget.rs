//! Budget category model.

use serde::{Deserialize, Serialize};

use super::{BudgetId, Classification};

/// A named allocation inside a budget category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCategory {
    /// Label shown to the user.
    pub name: String,
    /// Allocated (target) amount, not a running total.
    pub amount: f64,
}

impl SubCategory {
    /// Creates a subcategory.
    #[inline]
    #[must_use]
    pub fn new<N: Into<String>>(name: N, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// A budget category with its subcategory allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Unique identifier.
    pub id: BudgetId,
    /// Category label (mutable).
    pub category: String,
    /// Allocations making up this category.
    pub sub_categories: Vec<SubCategory>,
    /// Needs / wants / savings bucket.
    pub classification: Classification,
}

impl Budget {
    /// Builds a budget with a freshly generated identifier.
    #[inline]
    #[must_use]
    pub fn new<C: Into<String>>(
        category: C,
        classification: Classification,
        sub_categories: Vec<SubCategory>,
    ) -> Self {
        Self {
            id: BudgetId::random(),
            category: category.into(),
            sub_categories,
            classification,
        }
    }

    /// Sum of all subcategory allocations.
    ///
    /// See [`crate::calc::category_total`].
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        crate::calc::category_total(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_budget() {
        let json = r#"{
            "id": "b-1",
            "category": "Housing",
            "subCategories": [
                {"name": "Rent", "amount": 1200},
                {"name": "Utilities", "amount": 150.5}
            ],
            "classification": "needs"
        }"#;
        let budget: Budget = serde_json::from_str(json).unwrap();
        assert_eq!(budget.id, BudgetId::new("b-1".to_owned()));
        assert_eq!(budget.sub_categories.len(), 2);
        assert_eq!(budget.classification, Classification::Needs);
        assert!((budget.total() - 1350.5).abs() < 1e-9);
    }

    #[test]
    fn serialize_uses_camel_case_sub_categories() {
        let budget = Budget::new(
            "Fun",
            Classification::Wants,
            vec![SubCategory::new("Movies", 30.0)],
        );
        let value = serde_json::to_value(&budget).unwrap();
        assert!(value.get("subCategories").is_some());
        assert_eq!(value["classification"], "wants");
    }
}
