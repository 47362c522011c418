//! Storage configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use unilib_core::TenantId;

use crate::registry::Endpoints;

/// Where each tenant's data lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Root directory; tenants without an explicit endpoint live at `<data_dir>/<tenant>`.
    #[serde(default = "StoreConfig::default_data_dir")]
    pub data_dir: PathBuf,

    /// Endpoint for the `ctu` tenant.
    #[serde(default)]
    pub ctu_url: Option<String>,

    /// Endpoint for the `fpt` tenant.
    #[serde(default)]
    pub fpt_url: Option<String>,

    /// Endpoint for the `tdu` tenant.
    #[serde(default)]
    pub tdu_url: Option<String>,

    /// Endpoint for the aggregate database.
    #[serde(default)]
    pub universities_url: Option<String>,

    /// Upper bound on opening one connection, in seconds.
    #[serde(default = "StoreConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl StoreConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("/data/unilib")
    }

    const fn default_connect_timeout() -> u64 {
        10
    }

    /// A config rooted at `data_dir` with no overrides.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// The explicit endpoint configured for `tenant`, if any.
    #[must_use]
    pub fn url_for(&self, tenant: TenantId) -> Option<&str> {
        match tenant {
            TenantId::Ctu => self.ctu_url.as_deref(),
            TenantId::Fpt => self.fpt_url.as_deref(),
            TenantId::Tdu => self.tdu_url.as_deref(),
            TenantId::Universities => self.universities_url.as_deref(),
        }
    }

    /// Resolve the endpoint table.
    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        let endpoint = |tenant: TenantId| {
            self.url_for(tenant).map_or_else(
                || self.data_dir.join(tenant.as_str()).display().to_string(),
                ToString::to_string,
            )
        };

        TenantId::INSTITUTIONS.iter().fold(
            Endpoints::new(endpoint(TenantId::Universities)),
            |endpoints, &tenant| endpoints.with_tenant(tenant, endpoint(tenant)),
        )
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            ctu_url: None,
            fpt_url: None,
            tdu_url: None,
            universities_url: None,
            connect_timeout_seconds: Self::default_connect_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("/data/unilib"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn tenants_default_below_data_dir() {
        let endpoints = StoreConfig::with_data_dir("/srv/lib").endpoints();
        assert_eq!(endpoints.resolve(TenantId::Fpt), "/srv/lib/fpt");
        assert_eq!(endpoints.resolve(TenantId::Universities), "/srv/lib/universities");
    }

    #[test]
    fn explicit_urls_win() {
        let config = StoreConfig {
            tdu_url: Some("rocksdb:///mnt/tdu".to_string()),
            ..StoreConfig::with_data_dir("/srv/lib")
        };
        let endpoints = config.endpoints();
        assert_eq!(endpoints.resolve(TenantId::Tdu), "rocksdb:///mnt/tdu");
        assert_eq!(endpoints.resolve(TenantId::Ctu), "/srv/lib/ctu");
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"ctu_url": "/mnt/ctu"}"#).unwrap();
        assert_eq!(config.url_for(TenantId::Ctu), Some("/mnt/ctu"));
        assert_eq!(config.connect_timeout_seconds, 10);
    }
}
