//! Namespaced collection persistence over a [`KvBackend`].
//!
//! One key per collection, `"{namespace}_{db_name}_{collection}"`, holding the
//! JSON array of all its documents. Reads are tolerant: a missing key, a
//! malformed value or a backend read error all yield an empty collection.
//! Writes report failure to the caller.

use crate::config::StoreConfig;
use crate::error::PortalDbResult;
use crate::storage::KvBackend;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

const HEALTH_CHECK_SUFFIX: &str = "__connection_check";

/// Collection-level view of a key-value backend.
#[derive(Clone)]
pub struct BackingStore {
    backend: Arc<dyn KvBackend>,
    config: StoreConfig,
}

impl BackingStore {
    pub fn new(backend: Arc<dyn KvBackend>, config: &StoreConfig) -> Self {
        Self {
            backend,
            config: config.clone(),
        }
    }

    /// Backing key for a collection.
    pub fn key(&self, collection: &str) -> String {
        self.config.collection_key(collection)
    }

    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Load a collection. Never fails; anything unreadable is an empty collection.
    pub fn read_collection(&self, collection: &str) -> Vec<Value> {
        let key = self.key(collection);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(%key, error = %e, "backing store read failed, treating collection as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(docs)) => {
                debug!(%key, count = docs.len(), "loaded collection");
                docs
            }
            Ok(other) => {
                warn!(%key, kind = json_kind(&other), "persisted collection is not an array, treating as empty");
                Vec::new()
            }
            Err(e) => {
                warn!(%key, error = %e, "malformed JSON in backing store, treating collection as empty");
                Vec::new()
            }
        }
    }

    /// Serialize and store the full collection.
    pub fn write_collection(&self, collection: &str, docs: &[Value]) -> PortalDbResult<()> {
        let key = self.key(collection);
        let raw = serde_json::to_string(docs).inspect_err(|e| {
            error!(%key, error = %e, "failed to serialize collection");
        })?;
        self.backend.set(&key, &raw).inspect_err(|e| {
            error!(%key, bytes = raw.len(), error = %e, "failed to persist collection");
        })?;
        debug!(%key, count = docs.len(), "persisted collection");
        Ok(())
    }

    /// Delete a collection's key. Returns whether it existed.
    pub fn remove_collection(&self, collection: &str) -> PortalDbResult<bool> {
        self.backend.remove(&self.key(collection))
    }

    /// Names of collections persisted under this namespace and database.
    pub fn collection_names(&self) -> Vec<String> {
        let prefix = self.config.key_prefix();
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(prefix.as_str()).map(str::to_string))
                .filter(|name| name != HEALTH_CHECK_SUFFIX)
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to list backing store keys");
                Vec::new()
            }
        }
    }

    /// Round-trip a scratch key to check the backend accepts reads and writes.
    pub fn health_check(&self) -> bool {
        let key = self.key(HEALTH_CHECK_SUFFIX);
        let result = (|| -> PortalDbResult<bool> {
            self.backend.set(&key, "ok")?;
            let read_back = self.backend.get(&key)?;
            self.backend.remove(&key)?;
            Ok(read_back.as_deref() == Some("ok"))
        })();

        match result {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "backing store health check failed");
                false
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
