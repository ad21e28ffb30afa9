//! In-memory key-value backend
//!
//! Process-local, lost on drop. An optional byte quota emulates the size cap
//! of browser storage so write-failure paths can be exercised.

use crate::error::{PortalDbError, PortalDbResult};
use crate::storage::KvBackend;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory backend using BTreeMap
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, String>>,
    /// Maximum total size of keys + values in bytes
    quota: Option<usize>,
}

impl MemoryKv {
    /// Create an unbounded in-memory backend
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: None,
        }
    }

    /// Create a backend that refuses writes past `bytes` total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }
}

/// Total size of keys + values, leaving out `skip` (the key about to be replaced).
fn bytes_excluding(entries: &BTreeMap<String, String>, skip: &str) -> usize {
    entries
        .iter()
        .filter(|(k, _)| k.as_str() != skip)
        .map(|(k, v)| k.len() + v.len())
        .sum()
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> PortalDbResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortalDbResult<()> {
        let mut entries = self.entries.write();
        if let Some(quota) = self.quota {
            let needed = bytes_excluding(&entries, key) + key.len() + value.len();
            if needed > quota {
                return Err(PortalDbError::Storage(format!(
                    "quota exceeded: {needed} bytes needed, {quota} allowed"
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortalDbResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self) -> PortalDbResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
