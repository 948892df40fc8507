//! File-backed durable store.
//!
//! One file per key under a base directory. Each record is framed before
//! it hits disk: zstd-compressed payload plus a blake3 hash, so corruption
//! is caught at load time instead of surfacing as a garbled optimizer
//! state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BrewError, BrewResult};
use crate::store::StateStore;

const RECORD_EXTENSION: &str = "zst";
const COMPRESSION_LEVEL: i32 = 3;

/// On-disk frame around a record payload.
#[derive(Debug, Serialize, Deserialize)]
struct RecordFrame {
    /// Compressed payload bytes.
    data: Vec<u8>,
    /// Blake3 hash of the compressed payload.
    hash: [u8; 32],
}

impl RecordFrame {
    fn seal(payload: &[u8]) -> BrewResult<Self> {
        let data = zstd::encode_all(payload, COMPRESSION_LEVEL)?;
        let hash = blake3::hash(&data);
        Ok(Self {
            data,
            hash: *hash.as_bytes(),
        })
    }

    fn open(self) -> BrewResult<Vec<u8>> {
        let computed = blake3::hash(&self.data);
        if computed.as_bytes() != &self.hash {
            return Err(BrewError::storage("record integrity violation: hash mismatch"));
        }
        Ok(zstd::decode_all(&self.data[..])?)
    }
}

/// Durable store keeping one framed file per key.
///
/// Keys are used as file stems directly; callers are expected to hand in
/// slug-safe identifiers (the advisor's pair keys are `<bean>_<machine>`).
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base_path`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn open(base_path: impl Into<PathBuf>) -> BrewResult<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{key}.{RECORD_EXTENSION}"))
    }

    fn key_of(path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(ToString::to_string)
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> BrewResult<Option<Vec<u8>>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        let frame: RecordFrame = bincode::deserialize(&bytes)
            .map_err(|e| BrewError::storage(format!("record frame decode: {e}")))?;
        frame.open().map(Some)
    }

    fn load_all(&self) -> BrewResult<Vec<(String, Vec<u8>)>> {
        let mut records = Vec::new();
        for key in self.keys()? {
            if let Some(payload) = self.load(&key)? {
                records.push((key, payload));
            }
        }
        Ok(records)
    }

    fn upsert(&mut self, key: &str, value: &[u8]) -> BrewResult<()> {
        let frame = RecordFrame::seal(value)?;
        let bytes = bincode::serialize(&frame)
            .map_err(|e| BrewError::storage(format!("record frame encode: {e}")))?;
        std::fs::write(self.record_path(key), bytes)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> BrewResult<()> {
        let path = self.record_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> BrewResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if let Some(key) = Self::key_of(&entry.path()) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn clear(&mut self) -> BrewResult<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }
}
