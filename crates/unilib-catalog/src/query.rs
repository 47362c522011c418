//! Paginated list and by-key lookups against a single database.

use std::sync::Arc;

use tracing::debug;
use unilib_core::{Pagination, Sort, TenantId};
use unilib_store::{ConnectionRegistry, Document, Filter, FindOptions, Record};

use crate::error::{CatalogError, Result};
use crate::types::Page;

/// Answers read requests.
#[derive(Debug, Clone)]
pub struct QueryService {
    registry: Arc<ConnectionRegistry>,
}

impl QueryService {
    /// Create a query service over a connection registry.
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// One page of the records in `tenant` matching `filter`.
    ///
    /// The total and the page are fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn list<D: Document>(
        &self,
        tenant: TenantId,
        filter: Filter,
        pagination: Pagination,
        sort: Sort,
    ) -> Result<Page<Record<D>>> {
        debug!(kind = %D::KIND, %tenant, page = pagination.page, limit = pagination.limit, "Listing records");

        let repository = self.registry.repository::<D>(tenant).await?;
        let options = FindOptions::page(pagination, sort);
        let (total, items) = futures::try_join!(
            repository.count(filter.clone()),
            repository.find(filter, options)
        )?;

        Ok(Page {
            total,
            page: pagination.page,
            limit: pagination.limit,
            items,
        })
    }

    /// The record in `tenant` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` naming `key` if there is none.
    pub async fn get<D: Document>(
        &self,
        tenant: TenantId,
        key: &str,
        filter: Filter,
    ) -> Result<Record<D>> {
        self.registry
            .repository::<D>(tenant)
            .await?
            .find_one(filter)
            .await?
            .ok_or_else(|| CatalogError::not_found(D::KIND, key))
    }
}
