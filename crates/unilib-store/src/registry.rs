//! Lazily opened, process-lifetime connections keyed by entity kind and tenant.
//!
//! The first request for a `(kind, tenant)` pair opens the connection; every
//! later request, concurrent ones included, reuses it. A failed open is not
//! cached, so the next request retries.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use unilib_core::{EntityKind, TenantId};

use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::repository::Repository;
use crate::rocks::RocksStore;
use crate::schema::collection_path;
use crate::DocumentStore;

/// Default upper bound on opening one connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ROCKSDB_SCHEME: &str = "rocksdb://";

/// Opens a collection handle for an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open the collection of `kind` at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the endpoint is unusable.
    async fn connect(&self, endpoint: &str, kind: EntityKind) -> Result<Arc<dyn DocumentStore>>;
}

/// Connector for `RocksDB` endpoints.
///
/// Accepts `rocksdb:///absolute/path` or a bare filesystem path.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocksConnector;

impl RocksConnector {
    /// Strip the scheme from an endpoint, rejecting foreign schemes.
    fn directory(endpoint: &str) -> Result<&str> {
        if let Some(path) = endpoint.strip_prefix(ROCKSDB_SCHEME) {
            return Ok(path);
        }
        if endpoint.contains("://") {
            return Err(StoreError::Connection(format!(
                "unsupported endpoint scheme: {endpoint}"
            )));
        }
        Ok(endpoint)
    }
}

#[async_trait]
impl Connector for RocksConnector {
    async fn connect(&self, endpoint: &str, kind: EntityKind) -> Result<Arc<dyn DocumentStore>> {
        let path = collection_path(Path::new(Self::directory(endpoint)?), kind);

        let store = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&path).map_err(|e| {
                StoreError::Connection(format!("cannot create {}: {e}", path.display()))
            })?;
            RocksStore::open(&path)
        })
        .await
        .map_err(|e| StoreError::Connection(format!("open task failed: {e}")))??;

        Ok(Arc::new(store))
    }
}

/// Endpoint table: one endpoint per tenant, with the aggregate as fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    aggregate: String,
    tenants: HashMap<TenantId, String>,
}

impl Endpoints {
    /// A table where every tenant resolves to the aggregate endpoint.
    #[must_use]
    pub fn new(aggregate: impl Into<String>) -> Self {
        Self {
            aggregate: aggregate.into(),
            tenants: HashMap::new(),
        }
    }

    /// Give `tenant` its own endpoint.
    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantId, endpoint: impl Into<String>) -> Self {
        if tenant.is_aggregate() {
            self.aggregate = endpoint.into();
        } else {
            self.tenants.insert(tenant, endpoint.into());
        }
        self
    }

    /// The endpoint for `tenant`, or the aggregate endpoint if it has none.
    #[must_use]
    pub fn resolve(&self, tenant: TenantId) -> &str {
        self.tenants.get(&tenant).unwrap_or(&self.aggregate)
    }
}

type Slot = Arc<OnceCell<Arc<dyn DocumentStore>>>;

/// Cache of open connections.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    endpoints: Endpoints,
    connect_timeout: Duration,
    slots: RwLock<HashMap<(EntityKind, TenantId), Slot>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("endpoints", &self.endpoints)
            .field("connect_timeout", &self.connect_timeout)
            .field("connected", &self.len())
            .finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, endpoints: Endpoints) -> Self {
        Self {
            connector,
            endpoints,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Override the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The endpoint table.
    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Get the connection for `(kind, tenant)`, opening it on first use.
    ///
    /// Concurrent first requests share a single open.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the endpoint is unusable, or
    /// `StoreError::Timeout` if opening exceeds the connect timeout.
    pub async fn get(&self, kind: EntityKind, tenant: TenantId) -> Result<Arc<dyn DocumentStore>> {
        let slot = self.slot(kind, tenant);
        let store = slot.get_or_try_init(|| self.open(kind, tenant)).await?;
        Ok(Arc::clone(store))
    }

    /// Get a typed repository for `tenant`.
    ///
    /// # Errors
    ///
    /// Same as [`ConnectionRegistry::get`].
    pub async fn repository<D: Document>(&self, tenant: TenantId) -> Result<Repository<D>> {
        Ok(Repository::new(self.get(D::KIND, tenant).await?))
    }

    /// Whether the connection for `(kind, tenant)` is open.
    #[must_use]
    pub fn is_connected(&self, kind: EntityKind, tenant: TenantId) -> bool {
        self.slots
            .read()
            .get(&(kind, tenant))
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of open connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Whether no connection has been opened yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, kind: EntityKind, tenant: TenantId) -> Slot {
        if let Some(slot) = self.slots.read().get(&(kind, tenant)) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry((kind, tenant)).or_default())
    }

    async fn open(&self, kind: EntityKind, tenant: TenantId) -> Result<Arc<dyn DocumentStore>> {
        let endpoint = self.endpoints.resolve(tenant);
        debug!(%kind, %tenant, endpoint, "Opening connection");

        match tokio::time::timeout(self.connect_timeout, self.connector.connect(endpoint, kind))
            .await
        {
            Ok(Ok(store)) => {
                info!(%kind, %tenant, endpoint, "Connection established");
                Ok(store)
            }
            Ok(Err(e)) => {
                warn!(%kind, %tenant, endpoint, error = %e, "Connection failed");
                Err(e)
            }
            Err(_) => {
                warn!(%kind, %tenant, endpoint, "Connection timed out");
                Err(StoreError::Timeout(format!(
                    "{endpoint} after {:?}",
                    self.connect_timeout
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Filter;
    use crate::types::Author;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts connects and delegates to `RocksConnector`.
    #[derive(Default)]
    struct CountingConnector {
        connects: AtomicUsize,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(
            &self,
            endpoint: &str,
            kind: EntityKind,
        ) -> Result<Arc<dyn DocumentStore>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            RocksConnector.connect(endpoint, kind).await
        }
    }

    /// Fails the first `failures` connects.
    struct FailingConnector {
        failures: AtomicUsize,
    }

    #[async_trait]
    impl Connector for FailingConnector {
        async fn connect(
            &self,
            endpoint: &str,
            kind: EntityKind,
        ) -> Result<Arc<dyn DocumentStore>> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Connection("connection refused".to_string()));
            }
            RocksConnector.connect(endpoint, kind).await
        }
    }

    struct HangingConnector;

    #[async_trait]
    impl Connector for HangingConnector {
        async fn connect(&self, _: &str, _: EntityKind) -> Result<Arc<dyn DocumentStore>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(StoreError::Connection("unreachable".to_string()))
        }
    }

    fn endpoints(dir: &TempDir) -> Endpoints {
        let root = dir.path();
        Endpoints::new(root.join("universities").display().to_string())
            .with_tenant(TenantId::Ctu, root.join("ctu").display().to_string())
            .with_tenant(TenantId::Fpt, root.join("fpt").display().to_string())
    }

    #[test]
    fn endpoints_fall_back_to_aggregate() {
        let endpoints = Endpoints::new("/agg").with_tenant(TenantId::Ctu, "/ctu");
        assert_eq!(endpoints.resolve(TenantId::Ctu), "/ctu");
        assert_eq!(endpoints.resolve(TenantId::Tdu), "/agg");
        assert_eq!(endpoints.resolve(TenantId::Universities), "/agg");
    }

    #[test]
    fn foreign_schemes_are_rejected() {
        assert_eq!(RocksConnector::directory("rocksdb:///var/db").unwrap(), "/var/db");
        assert_eq!(RocksConnector::directory("/var/db").unwrap(), "/var/db");
        assert!(matches!(
            RocksConnector::directory("mongodb://localhost/ctu"),
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn connections_are_reused() {
        let dir = TempDir::new().unwrap();
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone(), endpoints(&dir));

        assert!(registry.is_empty());
        let first = registry.get(EntityKind::Book, TenantId::Ctu).await.unwrap();
        let second = registry.get(EntityKind::Book, TenantId::Ctu).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert!(registry.is_connected(EntityKind::Book, TenantId::Ctu));
        assert!(!registry.is_connected(EntityKind::Book, TenantId::Fpt));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_use_opens_once() {
        let dir = TempDir::new().unwrap();
        let connector = Arc::new(CountingConnector::default());
        let registry = Arc::new(ConnectionRegistry::new(connector.clone(), endpoints(&dir)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get(EntityKind::Student, TenantId::Fpt).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pairs_are_independent() {
        let dir = TempDir::new().unwrap();
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone(), endpoints(&dir));

        registry.get(EntityKind::Book, TenantId::Ctu).await.unwrap();
        registry.get(EntityKind::Book, TenantId::Fpt).await.unwrap();
        registry.get(EntityKind::Employee, TenantId::Ctu).await.unwrap();

        assert_eq!(connector.connects.load(Ordering::SeqCst), 3);
        assert_eq!(registry.len(), 3);
        assert!(dir.path().join("ctu/books").exists());
        assert!(dir.path().join("ctu/employees").exists());
    }

    #[tokio::test]
    async fn failed_connects_are_retried() {
        let dir = TempDir::new().unwrap();
        let connector = Arc::new(FailingConnector {
            failures: AtomicUsize::new(1),
        });
        let registry = ConnectionRegistry::new(connector, endpoints(&dir));

        let first = registry.get(EntityKind::Book, TenantId::Ctu).await;
        assert!(matches!(first, Err(StoreError::Connection(_))));
        assert!(!registry.is_connected(EntityKind::Book, TenantId::Ctu));

        registry.get(EntityKind::Book, TenantId::Ctu).await.unwrap();
        assert!(registry.is_connected(EntityKind::Book, TenantId::Ctu));
    }

    #[tokio::test]
    async fn slow_connects_time_out() {
        let dir = TempDir::new().unwrap();
        let registry = ConnectionRegistry::new(Arc::new(HangingConnector), endpoints(&dir))
            .with_connect_timeout(Duration::from_millis(50));

        let result = registry.get(EntityKind::Borrow, TenantId::Tdu).await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn typed_repositories_share_the_connection() {
        let dir = TempDir::new().unwrap();
        let registry = ConnectionRegistry::new(Arc::new(RocksConnector), endpoints(&dir));

        let writer = registry.repository::<Author>(TenantId::Universities).await.unwrap();
        writer
            .create(Author {
                code: "A1".to_string(),
                full_name: "To Hoai".to_string(),
            })
            .await
            .unwrap();

        let reader = registry.repository::<Author>(TenantId::Universities).await.unwrap();
        assert!(reader.find_one(Filter::eq("code", "A1")).await.unwrap().is_some());
    }
}
