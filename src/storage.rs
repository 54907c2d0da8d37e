//! Byte-level persistence for workflows and run results.
//!
//! A [`StateStore`] only moves bytes. The typed helpers encode with bincode
//! (serde mode), so anything serializable can be stored under a key.

use crate::error::StorageError;
use crate::runtime::RunResult;
use crate::workflow::Workflow;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A key/value byte store supplied by the host.
pub trait StateStore: Send + Sync {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Returns `None` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

/// Process-local store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<AHashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, AHashMap<String, Vec<u8>>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStore {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), bytes);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.lock()?.remove(key).is_some())
    }
}

/// One file per key inside a directory.
///
/// Keys are restricted to ASCII letters, digits, `-`, `_` and `.` so they map
/// to plain file names inside the directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.bin", key)))
    }
}

impl StateStore for FileStore {
    fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::write(&path, bytes).map_err(|source| StorageError::Io {
            key: key.to_string(),
            source,
        })?;
        debug!(key, path = %path.display(), "Saved entry");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Encodes `value` with bincode and stores it under `key`.
pub fn save_value<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = encode_to_vec(value, standard()).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.save(key, bytes)
}

/// Loads and decodes the value stored under `key`.
pub fn load_value<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(bytes) = store.load(key)? else {
        return Ok(None);
    };
    decode_from_slice(&bytes, standard())
        .map(|(value, _)| Some(value))
        .map_err(|e| StorageError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })
}

pub fn save_workflow(
    store: &dyn StateStore,
    key: &str,
    workflow: &Workflow,
) -> Result<(), StorageError> {
    save_value(store, key, workflow)
}

pub fn load_workflow(store: &dyn StateStore, key: &str) -> Result<Option<Workflow>, StorageError> {
    load_value(store, key)
}

pub fn save_run(store: &dyn StateStore, key: &str, run: &RunResult) -> Result<(), StorageError> {
    save_value(store, key, run)
}

pub fn load_run(store: &dyn StateStore, key: &str) -> Result<Option<RunResult>, StorageError> {
    load_value(store, key)
}
