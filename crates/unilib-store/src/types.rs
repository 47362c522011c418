//! Domain types stored in the database.
//!
//! These types represent the persisted state of authors, books, students,
//! employees and loans, together with the partial updates each accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unilib_core::{EntityKind, TenantId};

use crate::document::{require, Document, FieldValue, Filter};
use crate::error::{Result, StoreError};

/// A book author. Authors are kept only in the aggregate database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Unique business code.
    pub code: String,
    /// Display name.
    pub full_name: String,
}

/// Partial update for an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Document for Author {
    const KIND: EntityKind = EntityKind::Author;
    const UNIQUE_FIELD: Option<&'static str> = Some("code");
    type Patch = AuthorPatch;

    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "code" => Some(FieldValue::from(&self.code)),
            "fullName" => Some(FieldValue::from(&self.full_name)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &AuthorPatch) {
        if let Some(full_name) = &patch.full_name {
            self.full_name.clone_from(full_name);
        }
    }

    fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("fullName", &self.full_name)
    }
}

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique business code; its first character selects the owning tenant.
    pub code: String,
    /// Title.
    pub title: String,
    /// Publisher name.
    pub publisher: String,
    /// Publication year.
    pub year: i32,
    /// Book category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Copies held.
    pub quantity: i64,
    /// Library site holding the copies.
    pub site: String,
    /// Business code of the author.
    pub author_id: String,
}

/// Partial update for a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookPatch {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New publisher.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// New publication year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// New category.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// New copy count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl Document for Book {
    const KIND: EntityKind = EntityKind::Book;
    const UNIQUE_FIELD: Option<&'static str> = Some("code");
    const VALIDATE_ON_UPDATE: bool = true;
    type Patch = BookPatch;

    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "code" => Some(FieldValue::from(&self.code)),
            "title" => Some(FieldValue::from(&self.title)),
            "publisher" => Some(FieldValue::from(&self.publisher)),
            "year" => Some(FieldValue::from(self.year)),
            "type" => Some(FieldValue::from(&self.kind)),
            "quantity" => Some(FieldValue::from(self.quantity)),
            "site" => Some(FieldValue::from(&self.site)),
            "authorId" => Some(FieldValue::from(&self.author_id)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &BookPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(publisher) = &patch.publisher {
            self.publisher.clone_from(publisher);
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(kind) = &patch.kind {
            self.kind.clone_from(kind);
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
    }

    fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("title", &self.title)?;
        require("publisher", &self.publisher)?;
        require("type", &self.kind)?;
        require("site", &self.site)?;
        require("authorId", &self.author_id)?;
        if self.year <= 0 {
            return Err(StoreError::Validation(format!(
                "year must be positive, got {}",
                self.year
            )));
        }
        if self.quantity < 0 {
            return Err(StoreError::Validation(format!(
                "quantity must not be negative, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// A student library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Unique business code.
    pub code: String,
    /// Display name.
    pub full_name: String,
    /// Postal address.
    pub address: String,
    /// Home institution; selects the tenant a new student is written to.
    pub university: TenantId,
    /// Field of study.
    pub major: String,
    /// Number of loans taken.
    pub borrow_count: i64,
}

/// Partial update for a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// New address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// New major.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    /// New loan count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_count: Option<i64>,
}

impl Document for Student {
    const KIND: EntityKind = EntityKind::Student;
    const UNIQUE_FIELD: Option<&'static str> = Some("code");
    const SHARES_CODES: bool = true;
    type Patch = StudentPatch;

    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "code" => Some(FieldValue::from(&self.code)),
            "fullName" => Some(FieldValue::from(&self.full_name)),
            "address" => Some(FieldValue::from(&self.address)),
            "university" => Some(FieldValue::from(self.university.as_str())),
            "major" => Some(FieldValue::from(&self.major)),
            "borrowCount" => Some(FieldValue::from(self.borrow_count)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &StudentPatch) {
        if let Some(full_name) = &patch.full_name {
            self.full_name.clone_from(full_name);
        }
        if let Some(address) = &patch.address {
            self.address.clone_from(address);
        }
        if let Some(major) = &patch.major {
            self.major.clone_from(major);
        }
        if let Some(borrow_count) = patch.borrow_count {
            self.borrow_count = borrow_count;
        }
    }

    fn mirror_scope(&self) -> Option<Filter> {
        Some(Filter::eq("university", self.university.as_str()))
    }

    fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("fullName", &self.full_name)?;
        require("address", &self.address)?;
        require("major", &self.major)?;
        if self.university.is_aggregate() {
            return Err(StoreError::Validation(
                "university must be one of ctu, fpt, tdu".to_string(),
            ));
        }
        Ok(())
    }
}

/// A library employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique business code.
    pub code: String,
    /// Display name.
    pub full_name: String,
    /// Postal address.
    pub address: String,
    /// Employment status.
    pub status: String,
    /// Library the employee works at.
    pub lib: String,
}

/// Partial update for an employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeePatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// New address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Document for Employee {
    const KIND: EntityKind = EntityKind::Employee;
    const UNIQUE_FIELD: Option<&'static str> = Some("code");
    type Patch = EmployeePatch;

    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "code" => Some(FieldValue::from(&self.code)),
            "fullName" => Some(FieldValue::from(&self.full_name)),
            "address" => Some(FieldValue::from(&self.address)),
            "status" => Some(FieldValue::from(&self.status)),
            "lib" => Some(FieldValue::from(&self.lib)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &EmployeePatch) {
        if let Some(full_name) = &patch.full_name {
            self.full_name.clone_from(full_name);
        }
        if let Some(address) = &patch.address {
            self.address.clone_from(address);
        }
        if let Some(status) = &patch.status {
            self.status.clone_from(status);
        }
    }

    fn validate(&self) -> Result<()> {
        require("code", &self.code)?;
        require("fullName", &self.full_name)?;
        require("address", &self.address)?;
        require("status", &self.status)?;
        require("lib", &self.lib)
    }
}

/// A loan of a book to a student.
///
/// Loans have no unique key: the same student may borrow the same book
/// several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
    /// Code of the borrowed book.
    pub book_code: String,
    /// Code of the borrowing student; selects the owning tenant.
    pub student_code: String,
    /// When the book was handed out.
    pub borrow_date: DateTime<Utc>,
    /// When the book is due back.
    pub return_date: DateTime<Utc>,
}

/// Partial update for a loan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BorrowPatch {
    /// Corrected hand-out date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_date: Option<DateTime<Utc>>,
    /// New due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<DateTime<Utc>>,
}

impl Document for Borrow {
    const KIND: EntityKind = EntityKind::Borrow;
    const UNIQUE_FIELD: Option<&'static str> = None;
    type Patch = BorrowPatch;

    fn unique_key(&self) -> Option<&str> {
        None
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "bookCode" => Some(FieldValue::from(&self.book_code)),
            "studentCode" => Some(FieldValue::from(&self.student_code)),
            "borrowDate" => Some(FieldValue::from(self.borrow_date)),
            "returnDate" => Some(FieldValue::from(self.return_date)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &BorrowPatch) {
        if let Some(borrow_date) = patch.borrow_date {
            self.borrow_date = borrow_date;
        }
        if let Some(return_date) = patch.return_date {
            self.return_date = return_date;
        }
    }

    fn validate(&self) -> Result<()> {
        require("bookCode", &self.book_code)?;
        require("studentCode", &self.student_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            code: "F001".to_string(),
            title: "Dune".to_string(),
            publisher: "Chilton".to_string(),
            year: 1965,
            kind: "novel".to_string(),
            quantity: 2,
            site: "east".to_string(),
            author_id: "A1".to_string(),
        }
    }

    #[test]
    fn book_patch_touches_only_present_fields() {
        let mut doc = book();
        doc.apply(&BookPatch {
            year: Some(2020),
            ..BookPatch::default()
        });
        assert_eq!(doc.year, 2020);
        assert_eq!(doc.title, "Dune");
        assert_eq!(doc.publisher, "Chilton");
        assert_eq!(doc.quantity, 2);
    }

    #[test]
    fn book_validation_rules() {
        assert!(book().validate().is_ok());

        let mut negative = book();
        negative.quantity = -1;
        assert!(matches!(negative.validate(), Err(StoreError::Validation(_))));

        let mut untitled = book();
        untitled.title = String::new();
        assert!(matches!(untitled.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn book_wire_names() {
        let json = serde_json::to_value(book()).unwrap();
        assert_eq!(json["type"], "novel");
        assert_eq!(json["authorId"], "A1");

        let patch: BookPatch = serde_json::from_str(r#"{"type":"essay"}"#).unwrap();
        assert_eq!(patch.kind.as_deref(), Some("essay"));
        assert!(patch.title.is_none());
    }

    #[test]
    fn student_must_belong_to_an_institution() {
        let mut student = Student {
            code: "B100".to_string(),
            full_name: "Nguyen Van A".to_string(),
            address: "Can Tho".to_string(),
            university: TenantId::Ctu,
            major: "CS".to_string(),
            borrow_count: 0,
        };
        assert!(student.validate().is_ok());
        assert_eq!(
            student.mirror_scope(),
            Some(Filter::eq("university", "ctu"))
        );
        assert!(book().mirror_scope().is_none());

        student.university = TenantId::Universities;
        assert!(student.validate().is_err());
    }

    #[test]
    fn borrow_has_no_unique_key() {
        let borrow = Borrow {
            book_code: "B1".to_string(),
            student_code: "F9".to_string(),
            borrow_date: Utc::now(),
            return_date: Utc::now(),
        };
        assert!(borrow.unique_key().is_none());
        assert_eq!(
            borrow.field("studentCode"),
            Some(FieldValue::from("F9"))
        );
    }

    #[test]
    fn employee_fields_by_wire_name() {
        let employee = Employee {
            code: "T7".to_string(),
            full_name: "Tran Thi B".to_string(),
            address: "Hau Giang".to_string(),
            status: "active".to_string(),
            lib: "central".to_string(),
        };
        assert_eq!(employee.field("fullName"), Some(FieldValue::from("Tran Thi B")));
        assert_eq!(employee.field("salary"), None);
    }
}
