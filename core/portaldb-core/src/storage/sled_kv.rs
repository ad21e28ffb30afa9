//! sled-backed durable key-value backend.
//!
//! Every `set`/`remove` is flushed before returning, so a write that returned
//! `Ok` survives a process restart.

use crate::error::PortalDbResult;
use crate::storage::KvBackend;
use std::path::Path;

/// Durable backend; all keys live in sled's default tree.
pub struct SledKv {
    db: sled::Db,
}

impl SledKv {
    /// Open (or create) the store at the given directory path.
    pub fn open(path: &Path) -> PortalDbResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open a temporary store (for testing). Data is deleted on drop.
    pub fn open_temporary() -> PortalDbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Ok(Self { db })
    }
}

impl KvBackend for SledKv {
    fn get(&self, key: &str) -> PortalDbResult<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(ivec) => Ok(Some(String::from_utf8_lossy(&ivec).into_owned())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> PortalDbResult<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PortalDbResult<bool> {
        let existed = self.db.remove(key.as_bytes())?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    fn keys(&self) -> PortalDbResult<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.db.iter() {
            let (k, _) = item?;
            keys.push(String::from_utf8_lossy(&k).into_owned());
        }
        Ok(keys)
    }

    fn flush(&self) -> PortalDbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
