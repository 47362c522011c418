//! Error types for the catalogue services.

use thiserror::Error;
use unilib_core::EntityKind;
use unilib_store::StoreError;

/// A result type using `CatalogError`.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur in catalogue operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The record is absent from the database authoritative for the operation.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind of the missing record.
        kind: EntityKind,
        /// Business key that was looked up.
        key: String,
    },

    /// A book references an author missing from the aggregate database.
    #[error("author not found: {0}")]
    AuthorNotFound(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Build a `NotFound` error.
    #[must_use]
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::AuthorNotFound(_) | Self::Store(StoreError::NotFound) => {
                404
            }
            Self::Store(StoreError::DuplicateKey(_)) => 409,
            Self::Store(StoreError::Validation(_)) => 400,
            Self::Store(
                StoreError::Connection(_) | StoreError::Timeout(_) | StoreError::Database(_),
            ) => 503,
            Self::Store(StoreError::Serialization(_)) => 500,
        }
    }

    /// Whether this is a connectivity failure.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        match self {
            Self::Store(e) => e.is_connectivity(),
            _ => false,
        }
    }
}
