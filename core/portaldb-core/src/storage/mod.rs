//! Storage module: the key-value substrate under every collection.
//!
//! All backends implement the [`KvBackend`] trait. Collections never talk to
//! a backend directly: [`BackingStore`] namespaces the keys and owns the JSON
//! (de)serialization of whole collections.

pub mod backing;
pub mod memory;
pub mod sled_kv;

pub use backing::BackingStore;
pub use memory::MemoryKv;
pub use sled_kv::SledKv;

use crate::error::PortalDbResult;

/// Opaque string key-value store (browser local storage in spirit).
///
/// # Contract
///
/// - `get`: Returns `None` for missing keys.
/// - `set`: Upsert; once it returns `Ok` the value survives a restart of a
///   durable backend.
/// - `remove`: Returns `true` if the key existed.
/// - `keys`: All keys, sorted.
/// - `flush`: Persists anything still buffered.
pub trait KvBackend: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> PortalDbResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> PortalDbResult<()>;

    /// Delete a key.
    fn remove(&self, key: &str) -> PortalDbResult<bool>;

    /// List every key held by this backend.
    fn keys(&self) -> PortalDbResult<Vec<String>>;

    /// Flush any buffered data to durable storage.
    fn flush(&self) -> PortalDbResult<()> {
        Ok(())
    }
}
