//! Evaluator error types.
//!
//! These errors are raised when a parameter set is rejected before any
//! computation takes place. Numeric degeneracy (zero test information) is not
//! an error: it is reported as an infinite standard error, see
//! [`crate::statistics::standard_error`].

use thiserror::Error;

/// Errors that can occur when building or evaluating a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrtError {
    /// An item specification violates its invariants.
    #[error("invalid item spec '{item}': {reason}")]
    InvalidSpec { item: String, reason: String },

    /// The latent-trait grid is empty or malformed.
    #[error("invalid evaluation grid: {0}")]
    InvalidGrid(String),

    /// A pharmacology or random-effect parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The random-effect correlation structure is malformed.
    #[error("invalid correlation structure: {0}")]
    InvalidCorrelation(String),
}

impl IrtError {
    /// Shorthand for an [`IrtError::InvalidSpec`] on the named item.
    pub fn invalid_spec(item: impl Into<String>, reason: impl Into<String>) -> Self {
        IrtError::InvalidSpec {
            item: item.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for evaluator operations.
pub type IrtResult<T> = std::result::Result<T, IrtError>;
