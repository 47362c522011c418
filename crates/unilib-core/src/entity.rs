//! The record kinds held by the catalogue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// One of the five logical record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A book author. Lives only in the aggregate database.
    Author,
    /// A catalogued book.
    Book,
    /// A student library member.
    Student,
    /// A library employee.
    Employee,
    /// A loan of a book to a student.
    Borrow,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Author,
        Self::Book,
        Self::Student,
        Self::Employee,
        Self::Borrow,
    ];

    /// The collection name used for this kind in every database.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Author => "authors",
            Self::Book => "books",
            Self::Student => "students",
            Self::Employee => "employees",
            Self::Borrow => "borrows",
        }
    }

    /// Singular, human-readable name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Book => "book",
            Self::Student => "student",
            Self::Employee => "employee",
            Self::Borrow => "borrow",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s || kind.collection() == s)
            .ok_or_else(|| CoreError::UnknownEntityKind(s.to_string()))
    }
}
