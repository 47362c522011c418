//! Per-entity tenant routing rules.
//!
//! A `TenantPolicy` answers three questions for one entity kind: which tenant
//! owns a code, whether writes are mirrored into the aggregate database, and
//! which database a list query reads when the caller names no tenant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unilib_core::{EntityKind, TenantId, TenantResolver};

/// Which set of routing rules to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// One rule set for every tenant-scoped kind: mirror everything,
    /// unmatched codes and unscoped lists go to the aggregate.
    #[default]
    Unified,
    /// Per-kind rules as deployed before unification.
    Legacy,
}

impl PolicyMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unified" => Ok(Self::Unified),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown routing policy: {other}")),
        }
    }
}

/// Where one write goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// The authoritative database.
    pub tenant: TenantId,
    /// Whether the aggregate database receives a copy.
    pub mirror: bool,
}

impl Placement {
    /// A write to `tenant` only.
    #[must_use]
    pub const fn single(tenant: TenantId) -> Self {
        Self {
            tenant,
            mirror: false,
        }
    }
}

/// Routing rules for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantPolicy {
    resolver: TenantResolver,
    mirrored: bool,
    list_default: TenantId,
    scope_lists_by_university: bool,
}

impl TenantPolicy {
    /// The rules for `kind` under `mode`.
    #[must_use]
    pub fn for_kind(kind: EntityKind, mode: PolicyMode) -> Self {
        match (kind, mode) {
            (EntityKind::Author, _) => Self {
                resolver: TenantResolver::with_rules(Vec::new(), TenantId::Universities),
                mirrored: false,
                list_default: TenantId::Universities,
                scope_lists_by_university: false,
            },
            (_, PolicyMode::Unified)
            | (EntityKind::Book | EntityKind::Employee, PolicyMode::Legacy) => Self {
                resolver: TenantResolver::new(TenantId::Universities),
                mirrored: true,
                list_default: TenantId::Universities,
                scope_lists_by_university: false,
            },
            (EntityKind::Student | EntityKind::Borrow, PolicyMode::Legacy) => Self {
                resolver: TenantResolver::new(TenantId::Tdu),
                mirrored: false,
                list_default: TenantId::Ctu,
                scope_lists_by_university: kind == EntityKind::Student,
            },
        }
    }

    /// The tenant owning `code`.
    #[must_use]
    pub fn resolve(&self, code: &str) -> TenantId {
        self.resolver.resolve(code)
    }

    /// Placement of a write whose authoritative database is `tenant`.
    ///
    /// Never mirrors a write that already targets the aggregate.
    #[must_use]
    pub const fn place(&self, tenant: TenantId) -> Placement {
        Placement {
            tenant,
            mirror: self.mirrored && !tenant.is_aggregate(),
        }
    }

    /// Placement of a write keyed by `code`.
    #[must_use]
    pub fn place_code(&self, code: &str) -> Placement {
        self.place(self.resolve(code))
    }

    /// Whether this kind is copied into the aggregate database.
    #[must_use]
    pub const fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// The database read by a list query that names no tenant.
    #[must_use]
    pub const fn list_default(&self) -> TenantId {
        self.list_default
    }

    /// Whether list queries also filter on the `university` field.
    #[must_use]
    pub const fn scopes_lists_by_university(&self) -> bool {
        self.scope_lists_by_university
    }
}
