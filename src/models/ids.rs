//! Newtype wrappers for entity identifiers.
//!
//! Every entity in the state tree is keyed by an opaque string. Wrapping
//! each kind separately keeps a payment id from being passed where a debt
//! id is expected.

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapping a `String` inner type.
///
/// Fresh ids are `"{prefix}-{uuid}"`.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident = $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Prefix of freshly generated identifiers.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh random identifier (prefixed UUID v4).
            #[inline]
            #[must_use]
            pub fn random() -> Self {
                Self(crate::format::generate_unique_id(Self::PREFIX))
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Unique identifier for a transaction.
    TransactionId = "transaction"
}

define_string_id! {
    /// Unique identifier for a budget category.
    BudgetId = "budget"
}

define_string_id! {
    /// Unique identifier for a debt (also carried over to its completed
    /// snapshot).
    DebtId = "debt"
}

define_string_id! {
    /// Unique identifier for a payment made against a debt.
    PaymentId = "payment"
}

define_string_id! {
    /// Unique identifier for an income entry.
    IncomeId = "income"
}

define_string_id! {
    /// Unique identifier for a savings goal.
    SavingsGoalId = "goal"
}

define_string_id! {
    /// Unique identifier for a contribution to a savings goal.
    ContributionId = "contribution"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debt_id_serializes_as_plain_string() {
        let id = DebtId::new("550e8400-e29b-41d4-a716-446655440000".to_owned());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""550e8400-e29b-41d4-a716-446655440000""#);
        let deserialized: DebtId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn random_ids_are_prefixed_uuids() {
        let first = PaymentId::random();
        let second = PaymentId::random();
        assert_ne!(first, second);
        let uuid_part = first.as_inner().strip_prefix("payment-").unwrap();
        assert!(uuid::Uuid::parse_str(uuid_part).is_ok());
        assert!(SavingsGoalId::random().as_inner().starts_with("goal-"));
        assert!(ContributionId::random()
            .as_inner()
            .starts_with("contribution-"));
    }

    #[test]
    fn string_id_display() {
        let id = BudgetId::new("budget-7".to_owned());
        assert_eq!(id.to_string(), "budget-7");
    }

    #[test]
    fn id_from_inner() {
        let id: IncomeId = "inc-1".into();
        assert_eq!(id.as_inner(), "inc-1");

        let id: SavingsGoalId = "goal-1".to_owned().into();
        assert_eq!(id.into_inner(), "goal-1");
    }
}
