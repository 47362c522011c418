//! Common error types for unilib.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while parsing core values from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The tenant name does not match any known institutional database.
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    /// The entity name does not match any known record kind.
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// The sort order is neither ascending nor descending.
    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),
}
