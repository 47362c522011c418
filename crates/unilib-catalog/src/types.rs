//! Request and response types for catalogue operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use unilib_core::{Pagination, Sort, SortOrder, TenantId};
use unilib_store::Filter;

use crate::policy::PolicyMode;

/// Configuration for the catalogue service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Routing rule set.
    #[serde(default)]
    pub policy: PolicyMode,
}

impl CatalogConfig {
    /// Config using `policy`.
    #[must_use]
    pub const fn with_policy(policy: PolicyMode) -> Self {
        Self { policy }
    }
}

/// Parameters of a list query.
///
/// `page` and `limit` take effect only together, as do `sort_by` and
/// `sort_order`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Tenant to read; the kind's default database when `None`.
    pub tenant: Option<TenantId>,
    /// One-based page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Field to sort on.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
}

impl ListQuery {
    /// Read a specific tenant.
    #[must_use]
    pub fn tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Request a page.
    #[must_use]
    pub fn page(mut self, page: u64, limit: u64) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Request an ordering.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    /// The normalized pagination window.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::from_params(self.page, self.limit)
    }

    /// The normalized sort.
    #[must_use]
    pub fn sorting(&self) -> Sort {
        Sort::from_params(self.sort_by.as_deref(), self.sort_order)
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Records matching the filter, across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Records on this page.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Transform the items, keeping the window.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            limit: self.limit,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Identity of a loan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanKey {
    /// Code of the borrowed book.
    pub book_code: String,
    /// Code of the borrowing student; selects the tenant.
    pub student_code: String,
}

impl LoanKey {
    /// Create a loan key.
    #[must_use]
    pub fn new(book_code: impl Into<String>, student_code: impl Into<String>) -> Self {
        Self {
            book_code: book_code.into(),
            student_code: student_code.into(),
        }
    }

    /// Filter selecting loans with this key.
    #[must_use]
    pub fn filter(&self) -> Filter {
        Filter::eq("bookCode", self.book_code.as_str()).and("studentCode", self.student_code.as_str())
    }
}

impl fmt::Display for LoanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.book_code, self.student_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_normalizes_lazily() {
        let query = ListQuery::default().page(3, 10).sort("year", SortOrder::Desc);
        assert_eq!(query.pagination().skip, 20);
        assert!(!query.sorting().is_natural());

        let partial = ListQuery {
            page: Some(3),
            sort_order: Some(SortOrder::Desc),
            ..ListQuery::default()
        };
        assert_eq!(partial.pagination(), Pagination::default());
        assert!(partial.sorting().is_natural());
    }

    #[test]
    fn page_map_keeps_window() {
        let page = Page {
            total: 7,
            page: 2,
            limit: 3,
            items: vec![1, 2, 3],
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.total, 7);
        assert_eq!(mapped.items, vec![10, 20, 30]);
    }

    #[test]
    fn loan_key_display() {
        assert_eq!(LoanKey::new("B1", "T10").to_string(), "B1/T10");
        assert_eq!(LoanKey::new("B1", "T10").filter().conditions().len(), 2);
    }
}
