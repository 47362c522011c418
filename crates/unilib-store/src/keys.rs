//! Key encoding utilities for `RocksDB`.

use unilib_core::DocumentId;

use crate::error::{Result, StoreError};

/// Encode a document key (the 16 id bytes, which sort by creation time).
#[must_use]
pub fn document_key(id: &DocumentId) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Decode a document key.
///
/// # Errors
///
/// Returns `StoreError::Database` if the key is not 16 bytes long.
pub fn decode_document_key(key: &[u8]) -> Result<DocumentId> {
    DocumentId::try_from(key).map_err(|e| StoreError::Database(format!("corrupt key: {e}")))
}

/// Encode a unique-code index key.
#[must_use]
pub fn code_key(code: &str) -> Vec<u8> {
    code.as_bytes().to_vec()
}
