//! Store configuration: namespace, database name, cache TTLs and timeouts.
//!
//! Defaults mirror the portal's first-run behaviour. Values can be
//! overridden from `PORTALDB_*` environment variables or a JSON file.

use crate::error::PortalDbResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Collections the portal hydrates on connect.
pub const DEFAULT_COLLECTIONS: [&str; 5] =
    ["users", "companies", "jobs", "job_categories", "applications"];

/// Configuration for a [`Database`](crate::store::Database) and the
/// [`DatabaseService`](crate::service::DatabaseService) built on it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Key prefix separating store data from unrelated persisted keys
    pub namespace: String,
    /// Logical database name, second key segment
    pub db_name: String,
    /// Collections hydrated eagerly on connect
    pub collections: Vec<String>,
    /// TTL of the "all categories" cache
    pub category_cache_ttl: Duration,
    /// TTL of the `check_connection` result
    pub connection_cache_ttl: Duration,
    /// Upper bound on `setup_database`
    pub setup_timeout: Duration,
    /// Simulated I/O delay per store operation (zero disables)
    pub op_latency: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "portaldb".to_string(),
            db_name: "megajobnepal".to_string(),
            collections: DEFAULT_COLLECTIONS.iter().map(|s| s.to_string()).collect(),
            category_cache_ttl: Duration::from_secs(30),
            connection_cache_ttl: Duration::from_secs(5),
            setup_timeout: Duration::from_secs(10),
            op_latency: Duration::ZERO,
        }
    }
}

/// Partial overrides as read from a JSON config file. Durations in milliseconds.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigOverrides {
    namespace: Option<String>,
    db_name: Option<String>,
    collections: Option<Vec<String>>,
    category_cache_ttl_ms: Option<u64>,
    connection_cache_ttl_ms: Option<u64>,
    setup_timeout_ms: Option<u64>,
    op_latency_ms: Option<u64>,
}

impl StoreConfig {
    pub fn new(namespace: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            db_name: db_name.into(),
            ..Self::default()
        }
    }

    pub fn with_collections(mut self, collections: &[&str]) -> Self {
        self.collections = collections.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_category_cache_ttl(mut self, ttl: Duration) -> Self {
        self.category_cache_ttl = ttl;
        self
    }

    pub fn with_connection_cache_ttl(mut self, ttl: Duration) -> Self {
        self.connection_cache_ttl = ttl;
        self
    }

    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.setup_timeout = timeout;
        self
    }

    pub fn with_op_latency(mut self, latency: Duration) -> Self {
        self.op_latency = latency;
        self
    }

    /// Key prefix shared by every collection of this database.
    pub fn key_prefix(&self) -> String {
        format!("{}_{}_", self.namespace, self.db_name)
    }

    /// Backing-store key of a collection: `{namespace}_{db_name}_{collection}`.
    pub fn collection_key(&self, collection: &str) -> String {
        format!("{}{}", self.key_prefix(), collection)
    }

    /// Apply `PORTALDB_*` environment variables over the current values.
    ///
    /// Unparseable numbers are ignored.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(v) = env::var("PORTALDB_NAMESPACE") {
            self.namespace = v;
        }
        if let Ok(v) = env::var("PORTALDB_DB_NAME") {
            self.db_name = v;
        }
        if let Some(ms) = env_millis("PORTALDB_CATEGORY_CACHE_TTL_MS") {
            self.category_cache_ttl = ms;
        }
        if let Some(ms) = env_millis("PORTALDB_CONNECTION_CACHE_TTL_MS") {
            self.connection_cache_ttl = ms;
        }
        if let Some(ms) = env_millis("PORTALDB_SETUP_TIMEOUT_MS") {
            self.setup_timeout = ms;
        }
        if let Some(ms) = env_millis("PORTALDB_OP_LATENCY_MS") {
            self.op_latency = ms;
        }
        self
    }

    /// Apply overrides from a JSON file. A missing file leaves the config unchanged.
    pub fn load_from_file(mut self, path: &Path) -> PortalDbResult<Self> {
        if !path.exists() {
            return Ok(self);
        }
        let json = fs::read_to_string(path)?;
        let o: ConfigOverrides = serde_json::from_str(&json)?;

        if let Some(v) = o.namespace {
            self.namespace = v;
        }
        if let Some(v) = o.db_name {
            self.db_name = v;
        }
        if let Some(v) = o.collections {
            self.collections = v;
        }
        if let Some(ms) = o.category_cache_ttl_ms {
            self.category_cache_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = o.connection_cache_ttl_ms {
            self.connection_cache_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = o.setup_timeout_ms {
            self.setup_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = o.op_latency_ms {
            self.op_latency = Duration::from_millis(ms);
        }
        Ok(self)
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = StoreConfig::default();
        assert_eq!(config.db_name, "megajobnepal");
        assert_eq!(config.collections.len(), 5);
        assert_eq!(config.category_cache_ttl, Duration::from_secs(30));
        assert_eq!(config.connection_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.op_latency, Duration::ZERO);
    }

    #[test]
    fn collection_key_layout() {
        let config = StoreConfig::new("mongodb", "megajobnepal");
        assert_eq!(config.collection_key("users"), "mongodb_megajobnepal_users");
        assert_eq!(config.key_prefix(), "mongodb_megajobnepal_");
    }

    #[test]
    fn env_overrides() {
        unsafe {
            env::set_var("PORTALDB_DB_NAME", "env_db");
            env::set_var("PORTALDB_SETUP_TIMEOUT_MS", "250");
            env::set_var("PORTALDB_OP_LATENCY_MS", "not-a-number");
        }

        let config = StoreConfig::default().load_from_env();
        assert_eq!(config.db_name, "env_db");
        assert_eq!(config.setup_timeout, Duration::from_millis(250));
        assert_eq!(config.op_latency, Duration::ZERO);

        unsafe {
            env::remove_var("PORTALDB_DB_NAME");
            env::remove_var("PORTALDB_SETUP_TIMEOUT_MS");
            env::remove_var("PORTALDB_OP_LATENCY_MS");
        }
    }

    #[test]
    fn file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portaldb.json");
        fs::write(
            &path,
            r#"{ "namespace": "file_ns", "category_cache_ttl_ms": 1500 }"#,
        )
        .unwrap();

        let config = StoreConfig::default().load_from_file(&path).unwrap();
        assert_eq!(config.namespace, "file_ns");
        assert_eq!(config.category_cache_ttl, Duration::from_millis(1500));
        assert_eq!(config.db_name, "megajobnepal");
    }

    #[test]
    fn missing_file_is_noop() {
        let config = StoreConfig::default()
            .load_from_file(Path::new("target/definitely_missing_portaldb.json"))
            .unwrap();
        assert_eq!(config, StoreConfig::default());
    }
}
