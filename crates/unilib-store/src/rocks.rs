//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `DocumentStore` trait.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use unilib_core::DocumentId;

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::DocumentStore;

/// RocksDB-backed collection.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    path: PathBuf,
    /// Serializes read-check-write sequences so unique codes stay unique.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksStore {
    /// Open or create a collection database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// The directory this collection lives in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }
}

impl DocumentStore for RocksStore {
    fn insert(&self, id: &DocumentId, unique_key: Option<&str>, body: &[u8]) -> Result<()> {
        let cf_documents = self.cf(cf::DOCUMENTS)?;
        let cf_codes = self.cf(cf::UNIQUE_CODES)?;

        let _guard = self.write_lock.lock();

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_documents, keys::document_key(id), body);

        if let Some(code) = unique_key {
            let code_key = keys::code_key(code);
            let taken = self
                .db
                .get_cf(&cf_codes, &code_key)
                .map_err(|e| StoreError::Database(e.to_string()))?
                .is_some();
            if taken {
                return Err(StoreError::DuplicateKey(code.to_string()));
            }
            batch.put_cf(&cf_codes, &code_key, keys::document_key(id));
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get(&self, id: &DocumentId) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf::DOCUMENTS)?;

        self.db
            .get_cf(&cf, keys::document_key(id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn lookup(&self, unique_key: &str) -> Result<Option<DocumentId>> {
        let cf = self.cf(cf::UNIQUE_CODES)?;

        self.db
            .get_cf(&cf, keys::code_key(unique_key))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| keys::decode_document_key(&data))
            .transpose()
    }

    fn replace(&self, id: &DocumentId, body: &[u8]) -> Result<()> {
        let cf = self.cf(cf::DOCUMENTS)?;
        let key = keys::document_key(id);

        let _guard = self.write_lock.lock();

        // Don't resurrect a document deleted since it was read
        if self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_none()
        {
            return Err(StoreError::NotFound);
        }

        self.db
            .put_cf(&cf, key, body)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn remove(&self, id: &DocumentId, unique_key: Option<&str>) -> Result<bool> {
        let cf_documents = self.cf(cf::DOCUMENTS)?;
        let cf_codes = self.cf(cf::UNIQUE_CODES)?;
        let key = keys::document_key(id);

        let _guard = self.write_lock.lock();

        let exists = self
            .db
            .get_cf(&cf_documents, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if !exists {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_documents, &key);
        if let Some(code) = unique_key {
            batch.delete_cf(&cf_codes, keys::code_key(code));
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(true)
    }

    fn scan(&self) -> Result<Vec<(DocumentId, Vec<u8>)>> {
        let cf = self.cf(cf::DOCUMENTS)?;

        let mut documents = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            documents.push((keys::decode_document_key(&key)?, value.into_vec()));
        }

        Ok(documents)
    }

    fn count(&self) -> Result<u64> {
        let cf = self.cf(cf::DOCUMENTS)?;

        let mut count = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item.map_err(|e| StoreError::Database(e.to_string()))?;
            count += 1;
        }

        Ok(count)
    }
}
