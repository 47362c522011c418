//! Document storage layer for unilib.
//!
//! This crate provides everything between the catalogue services and the bytes
//! on disk:
//!
//! - [`DocumentStore`]: a raw collection of CBOR documents with a unique-code
//!   index, implemented on `RocksDB` by [`RocksStore`]
//! - [`Repository`]: typed CRUD (`create`, `count`, `find`, `find_one`,
//!   `find_one_and_update`, `find_one_and_delete`) over any store handle
//! - [`ConnectionRegistry`]: lazily opened, process-lifetime handles keyed by
//!   entity kind and tenant
//!
//! # Layout
//!
//! Each tenant endpoint is a directory. Each entity kind gets its own `RocksDB`
//! instance below it:
//!
//! ```text
//! /data/unilib/
//! ├── ctu/          books/ students/ employees/ borrows/
//! ├── fpt/          ...
//! ├── tdu/          ...
//! └── universities/ authors/ books/ students/ employees/ borrows/
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unilib_store::{Filter, Repository, RocksStore};
//! use unilib_store::types::Author;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/unilib/universities/authors")?);
//! let authors: Repository<Author> = Repository::new(store);
//!
//! authors
//!     .create(Author { code: "A1".into(), full_name: "Nguyen Du".into() })
//!     .await?;
//! let found = authors.find_one(Filter::eq("code", "A1")).await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod document;
pub mod error;
pub mod keys;
pub mod registry;
pub mod repository;
pub mod rocks;
pub mod schema;
pub mod types;

pub use config::StoreConfig;
pub use document::{Document, FieldValue, Filter, Record};
pub use error::{Result, StoreError};
pub use registry::{ConnectionRegistry, Connector, Endpoints, RocksConnector};
pub use repository::{FindOptions, Populated, References, Repository};
pub use rocks::RocksStore;

use unilib_core::DocumentId;

/// A single collection of encoded documents.
///
/// This is the connection handle handed out by the registry. Implementations
/// must be safe for concurrent use; the repository calls them from the
/// blocking thread pool.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document.
    ///
    /// When `unique_key` is given it is recorded in the unique index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if `unique_key` is already taken.
    fn insert(&self, id: &DocumentId, unique_key: Option<&str>, body: &[u8]) -> Result<()>;

    /// Get a document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get(&self, id: &DocumentId) -> Result<Option<Vec<u8>>>;

    /// Resolve a unique key to the id of the document holding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn lookup(&self, unique_key: &str) -> Result<Option<DocumentId>>;

    /// Overwrite an existing document. The unique key must not change.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document doesn't exist.
    fn replace(&self, id: &DocumentId, body: &[u8]) -> Result<()>;

    /// Remove a document and its unique index entry.
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn remove(&self, id: &DocumentId, unique_key: Option<&str>) -> Result<bool>;

    /// All documents in natural (insertion) order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn scan(&self) -> Result<Vec<(DocumentId, Vec<u8>)>>;

    /// Number of documents in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count(&self) -> Result<u64>;
}
