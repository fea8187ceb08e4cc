//! Error types for store operations.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by a [`TopologyStore`](crate::TopologyStore).
///
/// `NotFound` is a distinguished variant: callers decide between "does not
/// exist yet" and "store failure" with [`StoreError::is_not_found`], never by
/// inspecting messages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entity is stored under the key.
    #[error("key not found: {key}")]
    NotFound {
        /// The store path that was looked up.
        key: String,
    },

    /// An insert-if-absent write found the key already present.
    #[error("key already exists: {key}")]
    AlreadyExists {
        /// The first conflicting store path.
        key: String,
    },

    /// Entity names cannot be mapped onto the key layout.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Error message.
        message: String,
    },

    /// The backend failed (connection, command, timeout).
    #[error("store operation failed: {operation}: {message}")]
    Backend {
        /// The operation that failed (e.g., "MGET", "MSETNX").
        operation: String,
        /// Error message.
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("serialization failed for {key}: {source}")]
    Serialization {
        /// The store path of the value.
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value decoded to an entity other than the one its key names.
    #[error("corrupt entry at {key}: {message}")]
    Corrupt {
        /// The store path of the value.
        key: String,
        /// Error message.
        message: String,
    },

    /// Store configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a backend error.
    pub fn backend(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Creates a corrupt entry error.
    pub fn corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns true if the looked-up entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true if an insert-if-absent write lost to an existing key.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("/tuplenet/entity_view/LR/r1");
        assert_eq!(err.to_string(), "key not found: /tuplenet/entity_view/LR/r1");
    }

    #[test]
    fn test_backend_error() {
        let err = StoreError::backend("MGET", "Connection refused");
        assert_eq!(
            err.to_string(),
            "store operation failed: MGET: Connection refused"
        );
    }

    #[test]
    fn test_discriminators() {
        assert!(StoreError::not_found("k").is_not_found());
        assert!(!StoreError::backend("GET", "timeout").is_not_found());
        assert!(StoreError::AlreadyExists { key: "k".into() }.is_already_exists());
        assert!(!StoreError::not_found("k").is_already_exists());
    }
}
