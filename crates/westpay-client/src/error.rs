//! Client error types.

use westpay_core::WestpayError;
use westpay_store::StoreError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the WestPay client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Domain rule violated.
    #[error(transparent)]
    Domain(#[from] WestpayError),

    /// Security rules rejected a write the site depends on.
    #[error("permission denied writing {path}: make sure the database rules allow writes to {path}")]
    PermissionDenied {
        /// The path that was rejected.
        path: String,
    },

    /// A record the operation needs does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A broadcast found no users to send to.
    #[error("No users found")]
    NoUsers,

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// Local storage file could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<westpay_core::IdError> for ClientError {
    fn from(e: westpay_core::IdError) -> Self {
        Self::Domain(e.into())
    }
}
