//! Tenant identifiers and business-code routing.
//!
//! The catalogue is split across three institutional databases plus one
//! aggregate database that holds a shadow copy of every mirrored record.
//! The owning tenant of a record is derived from the first character of its
//! business code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// One of the fixed set of databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantId {
    /// Can Tho University.
    Ctu,
    /// FPT University.
    Fpt,
    /// Tay Do University.
    Tdu,
    /// The cross-institution aggregate database.
    Universities,
}

impl TenantId {
    /// The three institutional tenants, excluding the aggregate.
    pub const INSTITUTIONS: [Self; 3] = [Self::Ctu, Self::Fpt, Self::Tdu];

    /// Every database, aggregate last.
    pub const ALL: [Self; 4] = [Self::Ctu, Self::Fpt, Self::Tdu, Self::Universities];

    /// The database name as used in filters, endpoints and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ctu => "ctu",
            Self::Fpt => "fpt",
            Self::Tdu => "tdu",
            Self::Universities => "universities",
        }
    }

    /// Whether this is the aggregate database.
    #[must_use]
    pub const fn is_aggregate(self) -> bool {
        matches!(self, Self::Universities)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tenant| tenant.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTenant(s.to_string()))
    }
}

/// Ordered prefix rules: the first rule whose character matches wins.
pub const DEFAULT_PREFIX_RULES: [(char, TenantId); 3] = [
    ('B', TenantId::Ctu),
    ('F', TenantId::Fpt),
    ('T', TenantId::Tdu),
];

/// Maps a business code to its owning tenant.
///
/// Only the first character of the code is inspected. No case folding or
/// trimming is applied: `"f001"` and `" F001"` do not match the `F` rule.
/// Codes that match no rule, including the empty code, resolve to the
/// fallback tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantResolver {
    rules: Vec<(char, TenantId)>,
    fallback: TenantId,
}

impl TenantResolver {
    /// Create a resolver with the default prefix rules.
    #[must_use]
    pub fn new(fallback: TenantId) -> Self {
        Self::with_rules(DEFAULT_PREFIX_RULES.to_vec(), fallback)
    }

    /// Create a resolver with custom ordered rules.
    #[must_use]
    pub fn with_rules(rules: Vec<(char, TenantId)>, fallback: TenantId) -> Self {
        Self { rules, fallback }
    }

    /// The tenant returned for codes matching no rule.
    #[must_use]
    pub const fn fallback(&self) -> TenantId {
        self.fallback
    }

    /// Resolve the owning tenant of a business code.
    #[must_use]
    pub fn resolve(&self, code: &str) -> TenantId {
        let Some(first) = code.chars().next() else {
            return self.fallback;
        };

        self.rules
            .iter()
            .find(|(prefix, _)| *prefix == first)
            .map_or(self.fallback, |(_, tenant)| *tenant)
    }
}
