//! REST gateway for the unilib library catalogue.
//!
//! This crate provides the public HTTP API over the catalogue services. It
//! handles:
//!
//! - Routing `/v1/<entity>/...` requests to the catalogue
//! - Request validation and list-query parsing
//! - Mapping catalogue errors to HTTP status codes and JSON error bodies
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unilib_catalog::CatalogService;
//! use unilib_gateway::{create_router, GatewayConfig, GatewayState};
//! use unilib_store::{ConnectionRegistry, RocksConnector, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = StoreConfig::default().endpoints();
//! let registry = Arc::new(ConnectionRegistry::new(Arc::new(RocksConnector), endpoints));
//! let catalog = Arc::new(CatalogService::with_defaults(registry));
//!
//! let state = GatewayState::new(catalog, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
