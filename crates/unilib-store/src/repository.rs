//! Typed CRUD over a document store.
//!
//! A `Repository<D>` wraps one collection handle. Every operation runs on the
//! blocking thread pool so `RocksDB` calls never stall the async runtime.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use unilib_core::{Pagination, Sort, SortOrder, DEFAULT_LIMIT};

use crate::document::{Document, Filter, Record};
use crate::error::{Result, StoreError};
use crate::types::{Author, Book};
use crate::DocumentStore;

/// Window and ordering for `Repository::find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    /// Sort keys; natural order when empty.
    pub sort: Sort,
    /// Records to skip.
    pub skip: u64,
    /// Maximum records to return.
    pub limit: u64,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            sort: Sort::natural(),
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FindOptions {
    /// Options for one page of results.
    #[must_use]
    pub fn page(pagination: Pagination, sort: Sort) -> Self {
        Self {
            sort,
            skip: pagination.skip,
            limit: pagination.limit,
        }
    }
}

/// Typed access to one collection.
pub struct Repository<D> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> D>,
}

impl<D> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<D> std::fmt::Debug for Repository<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("kind", &std::any::type_name::<D>())
            .finish_non_exhaustive()
    }
}

impl<D: Document> Repository<D> {
    /// Create a repository over a collection handle.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Run a store operation on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| StoreError::Database(format!("storage task failed: {e}")))?
    }

    /// Validate and insert a new document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the document breaks a schema rule,
    /// or `StoreError::DuplicateKey` if its code is already present.
    pub async fn create(&self, doc: D) -> Result<Record<D>> {
        self.insert(doc, true).await
    }

    /// Insert the aggregate copy of a tenant record.
    ///
    /// Copies of kinds that share codes stay out of the unique-code index, so
    /// the same code may arrive from several tenants.
    ///
    /// # Errors
    ///
    /// As for `create`.
    pub async fn create_mirror(&self, doc: D) -> Result<Record<D>> {
        self.insert(doc, !D::SHARES_CODES).await
    }

    async fn insert(&self, doc: D, indexed: bool) -> Result<Record<D>> {
        doc.validate()?;
        let record = Record::new(doc);
        let bytes = record.encode()?;

        self.blocking(move |store| {
            let unique_key = if indexed { record.body.unique_key() } else { None };
            store.insert(&record.id, unique_key, &bytes)?;
            Ok(record)
        })
        .await
    }

    /// Count the records matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn count(&self, filter: Filter) -> Result<u64> {
        self.blocking(move |store| {
            if filter.is_empty() {
                return store.count();
            }
            Ok(matching::<D>(store, &filter)?.len() as u64)
        })
        .await
    }

    /// Records matching `filter`, sorted, then windowed by skip and limit.
    ///
    /// Sorting is stable: ties keep natural order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn find(&self, filter: Filter, options: FindOptions) -> Result<Vec<Record<D>>> {
        self.blocking(move |store| {
            let mut records = matching::<D>(store, &filter)?;
            if !options.sort.is_natural() {
                records.sort_by(|a, b| compare(&options.sort, &a.body, &b.body));
            }

            let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
            let limit = usize::try_from(options.limit).unwrap_or(usize::MAX);
            Ok(records.into_iter().skip(skip).take(limit).collect())
        })
        .await
    }

    /// The first record matching `filter`, in natural order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn find_one(&self, filter: Filter) -> Result<Option<Record<D>>> {
        self.blocking(move |store| first_matching::<D>(store, &filter))
            .await
    }

    /// Apply `patch` to the first record matching `filter`.
    ///
    /// Returns the updated record, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the patched document breaks a schema
    /// rule and `D` validates on update; nothing is written in that case.
    pub async fn find_one_and_update(
        &self,
        filter: Filter,
        patch: D::Patch,
    ) -> Result<Option<Record<D>>> {
        self.blocking(move |store| {
            let Some(mut record) = first_matching::<D>(store, &filter)? else {
                return Ok(None);
            };

            record.body.apply(&patch);
            if D::VALIDATE_ON_UPDATE {
                record.body.validate()?;
            }
            record.updated_at = Utc::now();

            match store.replace(&record.id, &record.encode()?) {
                Ok(()) => Ok(Some(record)),
                Err(StoreError::NotFound) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Remove the first record matching `filter`.
    ///
    /// Returns the removed record, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn find_one_and_delete(&self, filter: Filter) -> Result<Option<Record<D>>> {
        self.blocking(move |store| {
            let Some(record) = first_matching::<D>(store, &filter)? else {
                return Ok(None);
            };

            if store.remove(&record.id, record.body.unique_key())? {
                Ok(Some(record))
            } else {
                Ok(None)
            }
        })
        .await
    }
}

fn matching<D: Document>(store: &dyn DocumentStore, filter: &Filter) -> Result<Vec<Record<D>>> {
    if let Some(code) = filter.unique_lookup::<D>() {
        let hit = by_unique_key::<D>(store, code)?;
        if hit.is_some() || !D::SHARES_CODES {
            return Ok(hit.into_iter().collect());
        }
    }

    let mut records = Vec::new();
    for (_, bytes) in store.scan()? {
        let record = Record::<D>::decode(&bytes)?;
        if filter.matches(&record.body) {
            records.push(record);
        }
    }
    Ok(records)
}

fn first_matching<D: Document>(
    store: &dyn DocumentStore,
    filter: &Filter,
) -> Result<Option<Record<D>>> {
    if let Some(code) = filter.unique_lookup::<D>() {
        let hit = by_unique_key::<D>(store, code)?;
        if hit.is_some() || !D::SHARES_CODES {
            return Ok(hit);
        }
    }

    for (_, bytes) in store.scan()? {
        let record = Record::<D>::decode(&bytes)?;
        if filter.matches(&record.body) {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

fn by_unique_key<D: Document>(store: &dyn DocumentStore, code: &str) -> Result<Option<Record<D>>> {
    let Some(id) = store.lookup(code)? else {
        return Ok(None);
    };
    store
        .get(&id)?
        .map(|bytes| Record::decode(&bytes))
        .transpose()
}

fn compare<D: Document>(sort: &Sort, a: &D, b: &D) -> Ordering {
    for key in sort.keys() {
        let ordering = a.field(&key.field).cmp(&b.field(&key.field));
        let ordering = match key.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// =============================================================================
// Population
// =============================================================================

/// A document that points at a record of kind `R` in another collection.
pub trait References<R: Document>: Document {
    /// Filter selecting the referenced record, if this document has a reference.
    fn reference_filter(&self) -> Option<Filter>;
}

impl References<Author> for Book {
    fn reference_filter(&self) -> Option<Filter> {
        if self.author_id.is_empty() {
            None
        } else {
            Some(Filter::eq("code", self.author_id.as_str()))
        }
    }
}

/// A record together with the record it references, when that still exists.
#[derive(Debug, Clone)]
pub struct Populated<D, R> {
    /// The primary record.
    pub record: Record<D>,
    /// The referenced record; `None` if the reference dangles.
    pub related: Option<Record<R>>,
}

/// Expand the reference of every record in `records` using `related`.
///
/// # Errors
///
/// Returns an error if the related collection cannot be read.
pub async fn populate<D, R>(
    records: Vec<Record<D>>,
    related: &Repository<R>,
) -> Result<Vec<Populated<D, R>>>
where
    D: References<R>,
    R: Document,
{
    let mut populated = Vec::with_capacity(records.len());
    for record in records {
        let related = match record.body.reference_filter() {
            Some(filter) => related.find_one(filter).await?,
            None => None,
        };
        populated.push(Populated { record, related });
    }
    Ok(populated)
}
