//! Error types for the storage layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("record not found")]
    NotFound,

    /// A record with the same unique code already exists in this database.
    #[error("duplicate key: code {0} already exists")]
    DuplicateKey(String),

    /// The document failed schema validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The connection to an endpoint could not be established.
    #[error("connection error: {0}")]
    Connection(String),

    /// Establishing a connection took longer than the configured timeout.
    #[error("timed out connecting to {0}")]
    Timeout(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true if the store could not be reached or failed mid-operation.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Database(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_classification() {
        assert!(StoreError::Connection("refused".into()).is_connectivity());
        assert!(StoreError::Timeout("rocksdb:///data".into()).is_connectivity());
        assert!(StoreError::Database("io".into()).is_connectivity());
        assert!(!StoreError::NotFound.is_connectivity());
        assert!(!StoreError::DuplicateKey("B1".into()).is_connectivity());
        assert!(!StoreError::Validation("year".into()).is_connectivity());
    }
}
