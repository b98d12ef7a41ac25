//! Error types for WestPay domain operations.

use crate::ids::IdError;
use crate::money::Money;
use crate::request::RequestStatus;

/// Result type for WestPay domain operations.
pub type Result<T> = std::result::Result<T, WestpayError>;

/// Errors that can occur in WestPay domain operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WestpayError {
    /// Insufficient wallet balance for a debit.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// Current balance.
        balance: Money,
        /// Requested debit.
        required: Money,
    },

    /// Invalid amount (zero, negative or below a product minimum).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Rating outside 1..=5.
    #[error("invalid rating: {0} (expected 1-5)")]
    InvalidRating(i64),

    /// Unknown product identifier.
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// A required field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Request status can only move out of `pending`.
    #[error("invalid status transition from {from:?} to {to:?}")]
    InvalidStatusTransition {
        /// The current status.
        from: RequestStatus,
        /// The requested status.
        to: RequestStatus,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
