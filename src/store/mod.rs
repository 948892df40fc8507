//! Durable key-value store for optimizer state.
//!
//! A narrow adapter: string key to serialized record bytes. One key per
//! (bean, machine) pair plus one well-known key for the configuration
//! record. Backends may be any medium; the crate ships an in-memory map
//! and a file-per-key backend with integrity framing.

mod file;

use std::collections::BTreeMap;

use crate::error::BrewResult;

pub use file::FileStore;

/// Durable-store adapter contract.
///
/// Errors surface to callers as `Storage` failures from the service
/// operation that triggered persistence.
pub trait StateStore: Send {
    /// Load one record, `None` if the key is absent.
    fn load(&self, key: &str) -> BrewResult<Option<Vec<u8>>>;

    /// Load every record.
    fn load_all(&self) -> BrewResult<Vec<(String, Vec<u8>)>>;

    /// Insert or replace one record.
    fn upsert(&mut self, key: &str, value: &[u8]) -> BrewResult<()>;

    /// Remove one record. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> BrewResult<()>;

    /// Enumerate stored keys.
    fn keys(&self) -> BrewResult<Vec<String>>;

    /// Remove every record.
    fn clear(&mut self) -> BrewResult<()>;
}

/// Volatile in-memory store, the default for tests and embedders that
/// persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> BrewResult<Option<Vec<u8>>> {
        Ok(self.records.get(key).cloned())
    }

    fn load_all(&self) -> BrewResult<Vec<(String, Vec<u8>)>> {
        Ok(self
            .records
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn upsert(&mut self, key: &str, value: &[u8]) -> BrewResult<()> {
        self.records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> BrewResult<()> {
        self.records.remove(key);
        Ok(())
    }

    fn keys(&self) -> BrewResult<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn clear(&mut self) -> BrewResult<()> {
        self.records.clear();
        Ok(())
    }
}
