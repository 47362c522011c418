//! The document model: typed records, field values and filters.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use unilib_core::{DocumentId, EntityKind};

use crate::error::{Result, StoreError};

/// A record kind that can be persisted in a collection.
///
/// Field access by name is what filters and sorts operate on; names are the
/// wire names (`code`, `fullName`, `borrowDate`, ...).
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The entity kind stored in this collection.
    const KIND: EntityKind;

    /// Name of the field that is unique per database, if any.
    const UNIQUE_FIELD: Option<&'static str>;

    /// Whether `validate` runs again after a partial update.
    const VALIDATE_ON_UPDATE: bool = false;

    /// Whether aggregate copies may share a code.
    ///
    /// Such copies stay out of the unique-code index, so a lookup that misses
    /// the index falls back to a scan.
    const SHARES_CODES: bool = false;

    /// Partial update applied by `find_one_and_update`.
    type Patch: Clone + Send + Sync + 'static;

    /// The value of the unique field, if this kind has one.
    fn unique_key(&self) -> Option<&str>;

    /// Look up a field by its wire name.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Apply the fields present in `patch`, leaving the others untouched.
    fn apply(&mut self, patch: &Self::Patch);

    /// Conditions that tell apart aggregate copies sharing a code.
    fn mirror_scope(&self) -> Option<Filter> {
        None
    }

    /// Check schema rules.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` describing the first violated rule.
    fn validate(&self) -> Result<()>;
}

/// A single comparable field value.
///
/// Values of different variants order by variant (`Int < Text < Date`), which
/// keeps sorting total even for mixed data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
    /// Timestamp value.
    Date(DateTime<Utc>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// A conjunction of field equality conditions.
///
/// The empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, FieldValue)>,
}

impl Filter {
    /// A filter matching every record.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// A filter matching records whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::all().and(field, value)
    }

    /// Add an equality condition.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Add every condition of `other`.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// The conditions, in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(String, FieldValue)] {
        &self.conditions
    }

    /// Whether this filter matches every record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `doc` satisfies every condition.
    #[must_use]
    pub fn matches<D: Document>(&self, doc: &D) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| doc.field(field).as_ref() == Some(value))
    }

    /// If this filter is exactly an equality on `D`'s unique field, the code
    /// to look up in the unique index.
    #[must_use]
    pub fn unique_lookup<D: Document>(&self) -> Option<&str> {
        let unique = D::UNIQUE_FIELD?;
        match self.conditions.as_slice() {
            [(field, FieldValue::Text(code))] if field == unique => Some(code),
            _ => None,
        }
    }
}

/// The stored form of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<D> {
    /// Store-generated identifier.
    pub id: DocumentId,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// The business fields.
    pub body: D,
}

impl<D: Document> Record<D> {
    /// Wrap a new document with a fresh id and timestamps.
    #[must_use]
    pub fn new(body: D) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::generate(),
            created_at: now,
            updated_at: now,
            body,
        }
    }

    /// Serialize the record using CBOR.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a record from CBOR.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the bytes are not a valid record.
    pub fn decode(data: &[u8]) -> Result<Self> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Require a non-empty string field.
///
/// # Errors
///
/// Returns `StoreError::Validation` naming the field if it is blank.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Author, Book};

    fn book(code: &str, year: i32) -> Book {
        Book {
            code: code.to_string(),
            title: "Rust in Action".to_string(),
            publisher: "Manning".to_string(),
            year,
            kind: "textbook".to_string(),
            quantity: 3,
            site: "main".to_string(),
            author_id: "A1".to_string(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&book("B1", 2020)));
    }

    #[test]
    fn equality_conditions_are_conjunctive() {
        let doc = book("B1", 2020);
        assert!(Filter::eq("code", "B1").and("year", 2020).matches(&doc));
        assert!(!Filter::eq("code", "B1").and("year", 2021).matches(&doc));
        assert!(!Filter::eq("missing", "x").matches(&doc));
    }

    #[test]
    fn merged_filters_keep_both_sides() {
        let doc = book("B1", 2020);
        let merged = Filter::eq("code", "B1").merge(Filter::eq("year", 2021));
        assert_eq!(merged.conditions().len(), 2);
        assert!(!merged.matches(&doc));
        assert!(Filter::eq("code", "B1").merge(Filter::all()).matches(&doc));
    }

    #[test]
    fn unique_lookup_only_for_plain_code_filters() {
        assert_eq!(Filter::eq("code", "A1").unique_lookup::<Author>(), Some("A1"));
        assert_eq!(
            Filter::eq("code", "A1")
                .and("fullName", "X")
                .unique_lookup::<Author>(),
            None
        );
        assert_eq!(Filter::eq("fullName", "X").unique_lookup::<Author>(), None);
    }

    #[test]
    fn field_values_order_within_variant() {
        assert!(FieldValue::Int(1) < FieldValue::Int(2));
        assert!(FieldValue::from("a") < FieldValue::from("b"));
        assert!(None < Some(FieldValue::Int(0)));
    }

    #[test]
    fn record_cbor_roundtrip() {
        let record = Record::new(book("F001", 2019));
        let bytes = record.encode().unwrap();
        let decoded: Record<Book> = Record::decode(&bytes).unwrap();
        assert_eq!(decoded.id, record.id);
        assert_eq!(decoded.body, record.body);
    }

    #[test]
    fn require_rejects_blank() {
        assert!(require("title", "Dune").is_ok());
        assert!(matches!(
            require("title", "  "),
            Err(StoreError::Validation(msg)) if msg == "title is required"
        ));
    }
}
