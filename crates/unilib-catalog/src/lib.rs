//! Catalogue services for unilib.
//!
//! This crate holds the business logic between the REST gateway and the
//! document store: which tenant owns a record, how writes are mirrored into
//! the aggregate database, and how list queries are answered.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Gateway (HTTP)                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CatalogService                         │
//! │  ┌─────────────┐ ┌─────────────────┐ ┌─────────────────┐    │
//! │  │   Tenant    │ │   Dual-write    │ │     Query       │    │
//! │  │   Policy    │ │   Orchestrator  │ │     Service     │    │
//! │  └─────────────┘ └─────────────────┘ └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │ ConnectionRegistry  │
//!                   └─────────────────────┘
//!                 ┌──────┬──────┬──────┬──────────────┐
//!                 ▼      ▼      ▼      ▼              │
//!               ctu    fpt    tdu   universities ◄────┘ (mirror)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use unilib_catalog::{Catalog, CatalogService};
//! use unilib_store::types::Author;
//! use unilib_store::{ConnectionRegistry, RocksConnector, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = StoreConfig::with_data_dir("/tmp/unilib").endpoints();
//! let registry = Arc::new(ConnectionRegistry::new(Arc::new(RocksConnector), endpoints));
//! let catalog = CatalogService::with_defaults(registry);
//!
//! catalog
//!     .create_author(Author { code: "A1".into(), full_name: "Xuan Dieu".into() })
//!     .await?;
//! let author = catalog.find_author_by_code("A1").await?;
//! println!("{}", author.body.full_name);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod query;
pub mod service;
pub mod types;

pub use error::{CatalogError, Result};
pub use orchestrator::Orchestrator;
pub use policy::{Placement, PolicyMode, TenantPolicy};
pub use query::QueryService;
pub use service::{Catalog, CatalogService};
pub use types::{CatalogConfig, ListQuery, LoanKey, Page};
