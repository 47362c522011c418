//! HTTP request handlers.
//!
//! This module contains the endpoint handlers for the gateway API, plus the
//! request parsing and response shapes they share.

pub mod authors;
pub mod books;
pub mod borrows;
pub mod employees;
pub mod health;
pub mod students;

use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use unilib_catalog::{ListQuery, Page};
use unilib_core::{EntityKind, SortOrder, TenantId};
use unilib_store::Record;

use crate::error::ApiError;

/// Largest accepted page size.
pub const MAX_LIMIT: u64 = 100;

// =============================================================================
// Request Types
// =============================================================================

/// Query string of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// JSON-encoded [`ListFilter`].
    #[serde(default)]
    pub filter: Option<String>,
    /// One-based page number.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size, 1 to 100.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Relationship to expand; only `author` on books.
    #[serde(default)]
    pub populate: Option<String>,
}

/// The `filter` parameter of list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// Tenant to read.
    #[serde(default)]
    pub university: Option<String>,
    /// Field to sort on.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    pub sort_order: Option<String>,
}

impl ListParams {
    /// Validate and convert into a catalogue list query.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` for a malformed filter, an unknown
    /// university or sort order, or an out-of-range page or limit.
    pub fn to_query(&self) -> Result<ListQuery, ApiError> {
        if self.page == Some(0) {
            return Err(ApiError::bad_request("page must be at least 1"));
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_LIMIT {
                return Err(ApiError::bad_request(format!(
                    "limit must be between 1 and {MAX_LIMIT}"
                )));
            }
        }

        let filter: ListFilter = match &self.filter {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ApiError::bad_request(format!("invalid filter: {e}")))?,
            None => ListFilter::default(),
        };

        let tenant = filter
            .university
            .as_deref()
            .map(str::parse::<TenantId>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let sort_order = filter
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        Ok(ListQuery {
            tenant,
            page: self.page,
            limit: self.limit,
            sort_by: filter.sort_by,
            sort_order,
        })
    }
}

/// Require a non-blank string field.
pub(crate) fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Require an optional string field to be non-blank when present.
pub(crate) fn present(field: &str, value: Option<&String>) -> Result<(), ApiError> {
    value.map_or(Ok(()), |value| required(field, value))
}

// =============================================================================
// Response Types
// =============================================================================

/// A stored record as returned to clients: the business fields and timestamps.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse<D> {
    /// Business fields.
    #[serde(flatten)]
    pub body: D,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl<D> From<Record<D>> for RecordResponse<D> {
    fn from(record: Record<D>) -> Self {
        Self {
            body: record.body,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Wrap a page under the plural name of `kind`, e.g. `{"books": {...}}`.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the page cannot be serialized.
pub fn listing<T: Serialize>(kind: EntityKind, page: Page<T>) -> Result<Json<Value>, ApiError> {
    let page = serde_json::to_value(page).map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut body = Map::new();
    body.insert(kind.collection().to_string(), page);
    Ok(Json(Value::Object(body)))
}

/// Body returned by delete endpoints.
#[must_use]
pub fn deleted() -> Json<Value> {
    Json(Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(filter: Option<&str>, page: Option<u64>, limit: Option<u64>) -> ListParams {
        ListParams {
            filter: filter.map(str::to_string),
            page,
            limit,
            populate: None,
        }
    }

    #[test]
    fn empty_params_are_a_default_query() {
        assert_eq!(params(None, None, None).to_query().unwrap(), ListQuery::default());
    }

    #[test]
    fn filter_is_parsed() {
        let query = params(
            Some(r#"{"university":"fpt","sortBy":"year","sortOrder":"desc"}"#),
            Some(2),
            Some(10),
        )
        .to_query()
        .unwrap();

        assert_eq!(query.tenant, Some(TenantId::Fpt));
        assert_eq!(query.sort_by.as_deref(), Some("year"));
        assert_eq!(query.sort_order, Some(SortOrder::Desc));
        assert_eq!(query.pagination().skip, 10);
    }

    #[test]
    fn out_of_range_paging_is_rejected() {
        assert!(params(None, Some(0), Some(10)).to_query().is_err());
        assert!(params(None, Some(1), Some(0)).to_query().is_err());
        assert!(params(None, Some(1), Some(101)).to_query().is_err());
        assert!(params(None, Some(1), Some(100)).to_query().is_ok());
    }

    #[test]
    fn bad_filters_are_rejected() {
        assert!(params(Some("not json"), None, None).to_query().is_err());
        assert!(params(Some(r#"{"university":"hust"}"#), None, None)
            .to_query()
            .is_err());
        assert!(params(Some(r#"{"sortOrder":"sideways"}"#), None, None)
            .to_query()
            .is_err());
    }

    #[test]
    fn listing_uses_plural_name() {
        let page = Page {
            total: 0,
            page: 1,
            limit: 20,
            items: Vec::<u8>::new(),
        };
        let Json(body) = listing(EntityKind::Borrow, page).unwrap();
        assert_eq!(body["borrows"]["limit"], 20);
    }
}
