//! Error types for topology operations.

use thiserror::Error;
use tuplenet_store::StoreError;
use tuplenet_types::{EntityError, EntityKind, ParseError};

/// Result type alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Broad class of a [`TopologyError`], for callers mapping errors onto
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    InvalidFormat,
    NotFound,
    DependencyConflict,
    Persistence,
}

/// Errors returned by [`TopologyManager`](crate::TopologyManager).
///
/// Validation errors (`InvalidInput`, `InvalidFormat`) are always raised
/// before the store is touched.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A required field is empty or unusable as a name.
    #[error("invalid input: {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    /// An address, prefix or MAC failed to parse.
    #[error("invalid format for {field}: {source}")]
    InvalidFormat {
        field: &'static str,
        #[source]
        source: ParseError,
    },

    /// A referenced entity does not exist.
    #[error("{kind} {name} not found")]
    NotFound { kind: EntityKind, name: String },

    /// The operation would break or duplicate a relationship.
    #[error("dependency conflict on {target}: {reason}")]
    DependencyConflict { target: String, reason: String },

    /// The store failed for a reason other than a missing key.
    #[error("persistence failure during {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl TopologyError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_format(field: &'static str, source: ParseError) -> Self {
        Self::InvalidFormat { field, source }
    }

    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn conflict(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DependencyConflict {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(operation: &'static str, source: StoreError) -> Self {
        Self::Persistence { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DependencyConflict { .. } => ErrorKind::DependencyConflict,
            Self::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DependencyConflict { .. })
    }

    /// Returns true if the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Persistence { .. })
    }
}

impl From<EntityError> for TopologyError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::InvalidNatType(value) => Self::invalid_input(
                "nat_type",
                format!("{} is not a NAT type (expected snat or dnat)", value),
            ),
            EntityError::KindMismatch { expected, found } => Self::persistence(
                "decode",
                StoreError::corrupt(
                    "entity",
                    format!("expected {} entity, found {}", expected, found),
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = TopologyError::invalid_input("name", "must not be empty");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.is_client_error());

        let err = TopologyError::not_found(EntityKind::Router, "r1");
        assert_eq!(err.to_string(), "router r1 not found");
        assert!(err.is_not_found());

        let err = TopologyError::persistence("get router", StoreError::backend("GET", "timeout"));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_nat_type_error_is_invalid_input() {
        let err = TopologyError::from(EntityError::InvalidNatType("pat".to_string()));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("pat"));
    }
}
