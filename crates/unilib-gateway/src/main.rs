//! Unilib Gateway - REST API for the library catalogue
//!
//! This is the main entry point for the gateway service. Tenant databases are
//! opened lazily, so startup does not touch the data directory.
//!
//! # Configuration
//!
//! - `LISTEN_ADDR` (default `0.0.0.0:8080`)
//! - `DATA_DIR` (default `/data/unilib`); tenants default to `DATA_DIR/<tenant>`
//! - `CTU_DB_URL`, `FPT_DB_URL`, `TDU_DB_URL`, `UNIVERSITIES_DB_URL` override
//!   single endpoints (`rocksdb:///path` or a plain path)
//! - `CONNECT_TIMEOUT_SECONDS` (default 10)
//! - `ROUTING_POLICY`: `unified` (default) or `legacy`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unilib_catalog::{CatalogConfig, CatalogService, PolicyMode};
use unilib_gateway::{create_router, GatewayConfig, GatewayState};
use unilib_store::{ConnectionRegistry, RocksConnector, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,unilib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Unilib Gateway");

    // Load configuration from environment
    let listen_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/unilib".into());
    let connect_timeout_seconds = match std::env::var("CONNECT_TIMEOUT_SECONDS") {
        Ok(raw) => raw.parse()?,
        Err(_) => 10,
    };
    let policy: PolicyMode = match std::env::var("ROUTING_POLICY") {
        Ok(raw) => raw.parse()?,
        Err(_) => PolicyMode::default(),
    };

    let store_config = StoreConfig {
        ctu_url: std::env::var("CTU_DB_URL").ok(),
        fpt_url: std::env::var("FPT_DB_URL").ok(),
        tdu_url: std::env::var("TDU_DB_URL").ok(),
        universities_url: std::env::var("UNIVERSITIES_DB_URL").ok(),
        connect_timeout_seconds,
        ..StoreConfig::with_data_dir(&data_dir)
    };
    let endpoints = store_config.endpoints();

    tracing::info!(
        listen_addr = %listen_addr,
        data_dir = %data_dir,
        policy = %policy,
        connect_timeout_seconds,
        ?endpoints,
        "Gateway configuration loaded"
    );

    // Connections open on first use
    let registry = Arc::new(
        ConnectionRegistry::new(Arc::new(RocksConnector), endpoints)
            .with_connect_timeout(store_config.connect_timeout()),
    );
    let catalog = Arc::new(CatalogService::new(
        registry,
        CatalogConfig::with_policy(policy),
    ));
    tracing::info!(policy = %policy, "Catalog service initialized");

    let state = GatewayState::new(catalog, GatewayConfig::with_listen_addr(&listen_addr));

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
