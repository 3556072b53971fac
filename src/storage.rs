//! Key-value storage collaborator.
//!
//! Everything the contracts persist goes through the [`Storage`] trait: a
//! string-keyed byte store with get/set/delete and atomic batches. Typed access
//! (bincode-encoded values, defaults for absent keys) lives in [`StorageExt`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sled::Error),
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::Error),
    #[error("Invalid UTF-8 key in storage: {0}")]
    InvalidKey(#[from] std::string::FromUtf8Error),
    #[error("Storage lock poisoned")]
    LockPoisoned,
    #[error("Collection index range exhausted: {0}")]
    IndexExhausted(String),
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// All entries in key order.
    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError>;

    fn apply_batch(&self, batch: StorageBatch) -> Result<(), StorageError>;

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageBatch {
    pub ops: Vec<StorageOperation>,
}

impl StorageBatch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOperation {
    Put(String, Vec<u8>),
    Delete(String),
}

/// Typed helpers over any [`Storage`], values encoded with bincode.
pub trait StorageExt: Storage {
    fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let encoded = self.get(key)?;
        Ok(encoded.map(|e| bincode::deserialize(&e)).transpose()?)
    }

    fn get_or_default<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        Ok(self.get_value(key)?.unwrap_or(default))
    }

    /// Like `get_value` but absence is an error.
    fn get_some<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
        self.get_value(key)?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn set_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = bincode::serialize(value)?;
        self.set(key, &encoded)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

pub struct SledStorage {
    db: Db,
}

impl SledStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl Storage for SledStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let encoded = self.db.get(key)?;
        Ok(encoded.map(|e| e.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.db.remove(key)?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let mut entries = Vec::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            entries.push((String::from_utf8(key.to_vec())?, value.to_vec()));
        }
        Ok(entries)
    }

    fn apply_batch(&self, batch: StorageBatch) -> Result<(), StorageError> {
        let mut tree_batch = sled::Batch::default();
        for op in batch.ops {
            match op {
                StorageOperation::Put(key, value) => {
                    tree_batch.insert(key.as_bytes(), value);
                }
                StorageOperation::Delete(key) => {
                    tree_batch.remove(key.as_bytes());
                }
            }
        }
        self.db.apply_batch(tree_batch)?;
        Ok(())
    }
}

/// In-process store, used by tests and short-lived hosts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn apply_batch(&self, batch: StorageBatch) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        for op in batch.ops {
            match op {
                StorageOperation::Put(key, value) => {
                    entries.insert(key, value);
                }
                StorageOperation::Delete(key) => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// Write-buffering overlay over another store.
///
/// Reads see the overlay's own pending writes first, then fall through to the
/// base store. Nothing reaches the base until [`StagedStorage::into_batch`] is
/// applied, which is how a call's mutations commit all at once or not at all.
pub struct StagedStorage<'a> {
    base: &'a dyn Storage,
    pending: Mutex<BTreeMap<String, Option<Vec<u8>>>>,
}

impl<'a> StagedStorage<'a> {
    pub fn new(base: &'a dyn Storage) -> Self {
        Self {
            base,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn into_batch(self) -> Result<StorageBatch, StorageError> {
        let pending = self.pending.into_inner().map_err(|_| StorageError::LockPoisoned)?;
        let ops = pending
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => StorageOperation::Put(key, value),
                None => StorageOperation::Delete(key),
            })
            .collect();
        Ok(StorageBatch { ops })
    }
}

impl Storage for StagedStorage<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        {
            let pending = self.pending.lock().map_err(|_| StorageError::LockPoisoned)?;
            if let Some(staged) = pending.get(key) {
                return Ok(staged.clone());
            }
        }
        self.base.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().map_err(|_| StorageError::LockPoisoned)?;
        pending.insert(key.to_string(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().map_err(|_| StorageError::LockPoisoned)?;
        pending.insert(key.to_string(), None);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let mut merged: BTreeMap<String, Vec<u8>> = self.base.entries()?.into_iter().collect();
        let pending = self.pending.lock().map_err(|_| StorageError::LockPoisoned)?;
        for (key, value) in pending.iter() {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn apply_batch(&self, batch: StorageBatch) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().map_err(|_| StorageError::LockPoisoned)?;
        for op in batch.ops {
            match op {
                StorageOperation::Put(key, value) => {
                    pending.insert(key, Some(value));
                }
                StorageOperation::Delete(key) => {
                    pending.insert(key, None);
                }
            }
        }
        Ok(())
    }
}
