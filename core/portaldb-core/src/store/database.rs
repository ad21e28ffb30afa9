//! Database: root of the document store.
//!
//! Holds the in-memory copy of every collection touched so far and is the
//! only component that reads or writes the backing store. Collections go
//! through [`Database::get_collection_data`] and
//! [`Database::set_collection_data`] for everything.
//!
//! # Data flow
//!
//! - **hydrate**: first access to a collection loads it from the backing store
//! - **read**: clone of the in-memory array
//! - **write**: backing store first, then the in-memory array; a failed write
//!   leaves both untouched
//!
//! One `Database` per namespace + database name per process. Two live
//! instances over the same backend overwrite each other's collections.

use crate::config::StoreConfig;
use crate::error::{PortalDbError, PortalDbResult};
use crate::storage::{BackingStore, KvBackend};
use crate::store::collection::Collection;
use crate::store::index::IndexInfo;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

/// Store root.
pub struct Database {
    config: StoreConfig,
    backing: BackingStore,

    /// collection name → documents in storage order
    collections: DashMap<String, Vec<Value>>,

    /// collection name → recorded indexes
    indexes: RwLock<HashMap<String, Vec<IndexInfo>>>,

    connected: AtomicBool,

    hydrations: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Counters of backing-store and in-memory traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    /// Collections loaded from the backing store
    pub hydrations: u64,
    /// `get_collection_data` calls
    pub reads: u64,
    /// Successful `set_collection_data` calls
    pub writes: u64,
}

impl Database {
    /// Connect to the backing store and hydrate the configured collections.
    #[instrument(skip(backend, config), fields(db = %config.db_name))]
    pub fn connect(backend: Arc<dyn KvBackend>, config: StoreConfig) -> Arc<Self> {
        let backing = BackingStore::new(backend, &config);
        let db = Arc::new(Self {
            config,
            backing,
            collections: DashMap::new(),
            indexes: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
            hydrations: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        });

        for name in &db.config.collections {
            db.hydrate(name);
        }
        info!(
            "Connected to '{}' with {} collections",
            db.config.db_name,
            db.collections.len()
        );
        db
    }

    pub fn name(&self) -> &str {
        &self.config.db_name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Handle to a named collection. Collections exist implicitly.
    pub fn collection(self: &Arc<Self>, name: &str) -> Collection {
        Collection::new(name, Arc::clone(self))
    }

    fn hydrate(&self, name: &str) {
        if self.collections.contains_key(name) {
            return;
        }
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| {
                self.hydrations.fetch_add(1, Ordering::Relaxed);
                self.backing.read_collection(name)
            });
    }

    /// Snapshot of a collection's documents in storage order.
    ///
    /// Never fails: a closed database or unreadable collection yields an
    /// empty vector.
    pub fn get_collection_data(&self, name: &str) -> Vec<Value> {
        if !self.is_connected() {
            warn!(collection = name, "read from closed database");
            return Vec::new();
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.hydrate(name);
        self.collections
            .get(name)
            .map(|docs| docs.value().clone())
            .unwrap_or_default()
    }

    /// Replace a collection's documents, persisting synchronously.
    pub fn set_collection_data(&self, name: &str, data: Vec<Value>) -> PortalDbResult<()> {
        if !self.is_connected() {
            return Err(PortalDbError::NotConnected(self.config.db_name.clone()));
        }
        self.backing.write_collection(name, &data)?;
        self.collections.insert(name.to_string(), data);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Names of collections in memory or persisted, sorted.
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> =
            self.collections.iter().map(|e| e.key().clone()).collect();
        names.extend(self.backing.collection_names());
        names.into_iter().collect()
    }

    /// Delete a collection from memory and the backing store.
    pub fn drop_collection(&self, name: &str) -> PortalDbResult<bool> {
        if !self.is_connected() {
            return Err(PortalDbError::NotConnected(self.config.db_name.clone()));
        }
        let existed = self.backing.remove_collection(name)?;
        let in_memory = self.collections.remove(name).is_some();
        self.indexes.write().remove(name);
        debug!(collection = name, existed, "dropped collection");
        Ok(existed || in_memory)
    }

    /// Whether the backing store accepts a write/read/remove round trip.
    pub fn ping(&self) -> bool {
        self.is_connected() && self.backing.health_check()
    }

    /// Drop in-memory state. Persisted data is kept.
    pub fn close(&self) {
        if let Err(e) = self.backing.backend().flush() {
            warn!(error = %e, "flush on close failed");
        }
        self.collections.clear();
        self.indexes.write().clear();
        self.connected.store(false, Ordering::SeqCst);
        info!("Closed database '{}'", self.config.db_name);
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            hydrations: self.hydrations.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    /// Record an index. Returns `false` if one with the same name already exists.
    pub(crate) fn register_index(&self, collection: &str, info: IndexInfo) -> bool {
        let mut indexes = self.indexes.write();
        let entry = indexes.entry(collection.to_string()).or_default();
        if entry.iter().any(|existing| existing.name == info.name) {
            return false;
        }
        entry.push(info);
        true
    }

    pub(crate) fn indexes_of(&self, collection: &str) -> Vec<IndexInfo> {
        self.indexes
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Simulated driver round trip.
    pub(crate) async fn simulate_latency(&self) {
        if !self.config.op_latency.is_zero() {
            tokio::time::sleep(self.config.op_latency).await;
        }
    }
}
