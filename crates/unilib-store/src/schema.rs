//! Database schema definitions and column families.
//!
//! Every (entity kind, tenant) pair is stored in its own `RocksDB` instance at
//! `<endpoint>/<collection>`. Each instance holds one collection.

use std::path::{Path, PathBuf};

use unilib_core::EntityKind;

/// Column family names for a collection database.
pub mod cf {
    /// Primary records, keyed by `document_id`.
    pub const DOCUMENTS: &str = "documents";

    /// Index: unique business code to `document_id`.
    pub const UNIQUE_CODES: &str = "unique_codes";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::DOCUMENTS, cf::UNIQUE_CODES]
}

/// Directory holding the collection of `kind` below an endpoint directory.
#[must_use]
pub fn collection_path(endpoint_dir: &Path, kind: EntityKind) -> PathBuf {
    endpoint_dir.join(kind.collection())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_live_below_endpoint() {
        let path = collection_path(Path::new("/data/fpt"), EntityKind::Book);
        assert_eq!(path, PathBuf::from("/data/fpt/books"));
    }
}
