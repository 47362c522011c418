//! Dual writes across a tenant database and the aggregate database.
//!
//! Ordering per operation:
//!
//! - create: aggregate, then tenant. A tenant failure leaves an orphan in the
//!   aggregate; it is logged, not compensated.
//! - update and delete: tenant first. A miss there is `NotFound` and the
//!   aggregate is not touched. The aggregate leg is best effort; its failures
//!   are logged as drift and never reach the caller.
//!
//! The second leg never starts before the first completes. Aggregate legs of
//! update and delete match the copy on the tenant record's mirror scope too.

use std::fmt::Display;
use std::sync::Arc;

use tracing::{info, warn};
use unilib_core::TenantId;
use unilib_store::{ConnectionRegistry, Document, Filter, Record, StoreError};

use crate::error::{CatalogError, Result};
use crate::policy::Placement;

/// Sequences writes against the tenant and aggregate databases.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<ConnectionRegistry>,
}

impl Orchestrator {
    /// Create an orchestrator over a connection registry.
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Insert `doc`, mirroring it first when `placement` asks for it.
    ///
    /// Returns the tenant-side record.
    ///
    /// # Errors
    ///
    /// Returns the first failing leg's error; the tenant leg is not attempted
    /// if the aggregate leg fails.
    pub async fn create<D: Document>(
        &self,
        placement: Placement,
        key: &str,
        doc: D,
    ) -> Result<Record<D>> {
        if placement.mirror {
            if D::SHARES_CODES {
                self.check_tenant_code(placement.tenant, &doc).await?;
            }
            self.registry
                .repository::<D>(TenantId::Universities)
                .await?
                .create_mirror(doc.clone())
                .await?;
        }

        let created = match self.tenant_create(placement.tenant, doc).await {
            Ok(record) => record,
            Err(e) => {
                if placement.mirror {
                    warn!(
                        kind = %D::KIND,
                        key,
                        tenant = %placement.tenant,
                        error = %e,
                        "Tenant write failed after aggregate write; aggregate copy is orphaned"
                    );
                }
                return Err(e.into());
            }
        };

        info!(kind = %D::KIND, key, tenant = %placement.tenant, mirrored = placement.mirror, "Record created");
        Ok(created)
    }

    /// Patch the record matching `filter` in the tenant, then in the aggregate.
    ///
    /// Returns the updated tenant-side record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the tenant has no such record.
    pub async fn update<D: Document>(
        &self,
        placement: Placement,
        key: &str,
        filter: Filter,
        patch: D::Patch,
    ) -> Result<Record<D>> {
        let updated = self
            .registry
            .repository::<D>(placement.tenant)
            .await?
            .find_one_and_update(filter.clone(), patch.clone())
            .await?
            .ok_or_else(|| CatalogError::not_found(D::KIND, key))?;

        if placement.mirror {
            let outcome = match self.registry.repository::<D>(TenantId::Universities).await {
                Ok(aggregate) => {
                    let filter = mirror_filter(filter, &updated.body);
                    aggregate.find_one_and_update(filter, patch).await
                }
                Err(e) => Err(e),
            };
            report_drift::<D, _>("update", key, placement.tenant, outcome);
        }

        info!(kind = %D::KIND, key, tenant = %placement.tenant, "Record updated");
        Ok(updated)
    }

    /// Remove the record matching `filter` from the tenant, then from the aggregate.
    ///
    /// Returns the removed tenant-side record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the tenant has no such record.
    pub async fn delete<D: Document>(
        &self,
        placement: Placement,
        key: &str,
        filter: Filter,
    ) -> Result<Record<D>> {
        let removed = self
            .registry
            .repository::<D>(placement.tenant)
            .await?
            .find_one_and_delete(filter.clone())
            .await?
            .ok_or_else(|| CatalogError::not_found(D::KIND, key))?;

        if placement.mirror {
            let outcome = match self.registry.repository::<D>(TenantId::Universities).await {
                Ok(aggregate) => {
                    let filter = mirror_filter(filter, &removed.body);
                    aggregate.find_one_and_delete(filter).await
                }
                Err(e) => Err(e),
            };
            report_drift::<D, _>("delete", key, placement.tenant, outcome);
        }

        info!(kind = %D::KIND, key, tenant = %placement.tenant, "Record deleted");
        Ok(removed)
    }

    /// Fail before the aggregate leg when the tenant already holds the code.
    ///
    /// The aggregate cannot reject such a copy itself when codes are shared.
    async fn check_tenant_code<D: Document>(&self, tenant: TenantId, doc: &D) -> Result<()> {
        let (Some(field), Some(code)) = (D::UNIQUE_FIELD, doc.unique_key()) else {
            return Ok(());
        };
        let existing = self
            .registry
            .repository::<D>(tenant)
            .await?
            .find_one(Filter::eq(field, code))
            .await?;
        if existing.is_some() {
            return Err(StoreError::DuplicateKey(code.to_string()).into());
        }
        Ok(())
    }

    async fn tenant_create<D: Document>(
        &self,
        tenant: TenantId,
        doc: D,
    ) -> std::result::Result<Record<D>, StoreError> {
        self.registry.repository::<D>(tenant).await?.create(doc).await
    }
}

/// Narrow a tenant-side filter to the aggregate copy of `doc`.
fn mirror_filter<D: Document>(filter: Filter, doc: &D) -> Filter {
    match doc.mirror_scope() {
        Some(scope) => filter.merge(scope),
        None => filter,
    }
}

/// Log the outcome of a best-effort aggregate leg.
fn report_drift<D: Document, T>(
    operation: &str,
    key: &str,
    tenant: impl Display,
    outcome: std::result::Result<Option<T>, StoreError>,
) {
    match outcome {
        Ok(Some(_)) => {}
        Ok(None) => warn!(
            kind = %D::KIND,
            key,
            %tenant,
            operation,
            "Aggregate copy missing; databases have drifted"
        ),
        Err(e) => warn!(
            kind = %D::KIND,
            key,
            %tenant,
            operation,
            error = %e,
            "Aggregate write failed; databases have drifted"
        ),
    }
}
