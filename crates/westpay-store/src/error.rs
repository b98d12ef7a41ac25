//! Error types for WestPay store access.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached, or failed on its side.
    #[error("network error: {0}")]
    Network(String),

    /// Security rules rejected the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The store returned a non-retryable error response.
    #[error("store API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A path segment is empty or contains a forbidden character.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    /// Whether security rules rejected the operation.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Whether repeating the operation might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<westpay_core::IdError> for StoreError {
    fn from(e: westpay_core::IdError) -> Self {
        Self::InvalidPath(e.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Serialization(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
