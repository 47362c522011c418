//! Core types and utilities for unilib.
//!
//! This crate provides the pure, I/O-free building blocks shared by every other
//! unilib crate:
//!
//! - **Tenants**: the fixed set of institutional databases and the prefix rules
//!   that map a business code to its owning tenant
//! - **Entity kinds**: the five record kinds stored in the catalogue
//! - **Identifiers**: store-generated document identifiers
//! - **Query shaping**: pagination and sort normalization
//!
//! # Example
//!
//! ```
//! use unilib_core::{Pagination, TenantId, TenantResolver};
//!
//! let resolver = TenantResolver::new(TenantId::Universities);
//! assert_eq!(resolver.resolve("F001"), TenantId::Fpt);
//! assert_eq!(resolver.resolve("X001"), TenantId::Universities);
//!
//! let pagination = Pagination::from_params(Some(3), Some(10));
//! assert_eq!(pagination.skip, 20);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod ids;
pub mod query;
pub mod tenant;

pub use entity::EntityKind;
pub use error::{CoreError, Result};
pub use ids::{DocumentId, IdError};
pub use query::{Pagination, Sort, SortKey, SortOrder, DEFAULT_LIMIT};
pub use tenant::{TenantId, TenantResolver, DEFAULT_PREFIX_RULES};
