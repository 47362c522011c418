//! Pagination and sort normalization.
//!
//! These helpers turn the optional `page`/`limit`/`sortBy`/`sortOrder` inputs of a
//! list request into the canonical values used to shape a store query.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Page size used when the caller does not supply both `page` and `limit`.
pub const DEFAULT_LIMIT: u64 = 20;

/// Canonical pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// One-based page number.
    pub page: u64,
    /// Number of records to skip.
    pub skip: u64,
    /// Maximum number of records to return.
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Normalize optional page and limit inputs.
    ///
    /// Both values must be present and non-zero to take effect. If either is
    /// missing or zero the default window (page 1, skip 0, limit 20) is
    /// returned, regardless of the other value.
    #[must_use]
    pub fn from_params(page: Option<u64>, limit: Option<u64>) -> Self {
        match (page, limit) {
            (Some(page), Some(limit)) if page > 0 && limit > 0 => Self {
                page,
                skip: (page - 1).saturating_mul(limit),
                limit,
            },
            _ => Self::default(),
        }
    }
}

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    /// The canonical wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    /// Accepts the spellings document stores commonly take for a direction.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending" | "1" => Ok(Self::Asc),
            "desc" | "descending" | "-1" => Ok(Self::Desc),
            other => Err(CoreError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// A single `field -> direction` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Field name, in wire form (e.g. `year`, `fullName`).
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// An ordered mapping from field name to direction.
///
/// An empty sort leaves results in the store's natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    /// A sort that preserves natural order.
    #[must_use]
    pub const fn natural() -> Self {
        Self { keys: Vec::new() }
    }

    /// Sort by a single field.
    #[must_use]
    pub fn by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            keys: vec![SortKey {
                field: field.into(),
                order,
            }],
        }
    }

    /// Build a sort from optional `sortBy` and `sortOrder` inputs.
    ///
    /// Both must be present to produce an ordering; otherwise the sort is empty.
    #[must_use]
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<SortOrder>) -> Self {
        match (sort_by, sort_order) {
            (Some(field), Some(order)) if !field.is_empty() => Self::by(field, order),
            _ => Self::natural(),
        }
    }

    /// Append a tie-breaking key.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            order,
        });
        self
    }

    /// The keys, most significant first.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Whether this sort keeps natural order.
    #[must_use]
    pub fn is_natural(&self) -> bool {
        self.keys.is_empty()
    }
}
