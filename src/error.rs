//! Error types for the fintrack library.

/// All errors that can occur when using the finance store.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// State storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// A date string could not be turned into a calendar date.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// A monthly bucket key was not of the form `YEAR-MONTH`.
    #[error("invalid month key: {0:?}")]
    InvalidMonthKey(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FinanceError>;
