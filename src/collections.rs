//! Persistent collections namespaced by a key prefix.
//!
//! These mirror the collection shapes contracts already have deployed state
//! in, so the key layout must not change:
//!
//! | collection | element key          | bookkeeping keys                     |
//! |------------|----------------------|--------------------------------------|
//! | map        | `prefix::key`        | none                                 |
//! | vector     | `prefix::index`      | `prefix:len`                         |
//! | deque      | `prefix::index` (i32)| `prefix:front` (0), `prefix:back` (-1)|
//!
//! A collection holds only its prefix; every operation takes the storage it
//! should act on, so the same collection works against a staged overlay or the
//! committed store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::storage::{Storage, StorageError, StorageExt};

const ELEMENT_SEPARATOR: &str = "::";
const FRONT_SUFFIX: &str = ":front";
const BACK_SUFFIX: &str = ":back";
const LENGTH_SUFFIX: &str = ":len";

#[derive(Debug, Clone)]
pub struct PersistentMap<V> {
    prefix: String,
    _marker: PhantomData<V>,
}

impl<V: Serialize + DeserializeOwned> PersistentMap<V> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, ELEMENT_SEPARATOR, key)
    }

    pub fn get<S: Storage + ?Sized>(&self, storage: &S, key: &str) -> Result<Option<V>, StorageError> {
        storage.get_value(&self.key(key))
    }

    pub fn get_or<S: Storage + ?Sized>(&self, storage: &S, key: &str, default: V) -> Result<V, StorageError> {
        storage.get_or_default(&self.key(key), default)
    }

    pub fn set<S: Storage + ?Sized>(&self, storage: &S, key: &str, value: &V) -> Result<(), StorageError> {
        storage.set_value(&self.key(key), value)
    }

    pub fn contains<S: Storage + ?Sized>(&self, storage: &S, key: &str) -> Result<bool, StorageError> {
        storage.contains(&self.key(key))
    }

    pub fn delete<S: Storage + ?Sized>(&self, storage: &S, key: &str) -> Result<(), StorageError> {
        storage.delete(&self.key(key))
    }
}

#[derive(Debug, Clone)]
pub struct PersistentVector<V> {
    prefix: String,
    _marker: PhantomData<V>,
}

impl<V: Serialize + DeserializeOwned> PersistentVector<V> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            _marker: PhantomData,
        }
    }

    fn element_key(&self, index: u64) -> String {
        format!("{}{}{}", self.prefix, ELEMENT_SEPARATOR, index)
    }

    fn length_key(&self) -> String {
        format!("{}{}", self.prefix, LENGTH_SUFFIX)
    }

    pub fn len<S: Storage + ?Sized>(&self, storage: &S) -> Result<u64, StorageError> {
        storage.get_or_default(&self.length_key(), 0u64)
    }

    pub fn is_empty<S: Storage + ?Sized>(&self, storage: &S) -> Result<bool, StorageError> {
        Ok(self.len(storage)? == 0)
    }

    pub fn push<S: Storage + ?Sized>(&self, storage: &S, value: &V) -> Result<u64, StorageError> {
        let index = self.len(storage)?;
        storage.set_value(&self.element_key(index), value)?;
        storage.set_value(&self.length_key(), &(index + 1))?;
        Ok(index)
    }

    pub fn get<S: Storage + ?Sized>(&self, storage: &S, index: u64) -> Result<Option<V>, StorageError> {
        if index >= self.len(storage)? {
            return Ok(None);
        }
        storage.get_value(&self.element_key(index))
    }

    pub fn to_vec<S: Storage + ?Sized>(&self, storage: &S) -> Result<Vec<V>, StorageError> {
        let len = self.len(storage)?;
        (0..len)
            .map(|index| storage.get_some(&self.element_key(index)))
            .collect()
    }
}

/// Double-ended queue. Elements are pushed at the front under ever lower
/// indices and can be taken from either end.
#[derive(Debug, Clone)]
pub struct PersistentDeque<V> {
    prefix: String,
    _marker: PhantomData<V>,
}

impl<V: Serialize + DeserializeOwned> PersistentDeque<V> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            _marker: PhantomData,
        }
    }

    fn element_key(&self, index: i32) -> String {
        format!("{}{}{}", self.prefix, ELEMENT_SEPARATOR, index)
    }

    fn front_key(&self) -> String {
        format!("{}{}", self.prefix, FRONT_SUFFIX)
    }

    fn back_key(&self) -> String {
        format!("{}{}", self.prefix, BACK_SUFFIX)
    }

    fn front_index<S: Storage + ?Sized>(&self, storage: &S) -> Result<i32, StorageError> {
        storage.get_or_default(&self.front_key(), 0i32)
    }

    fn back_index<S: Storage + ?Sized>(&self, storage: &S) -> Result<i32, StorageError> {
        storage.get_or_default(&self.back_key(), -1i32)
    }

    pub fn len<S: Storage + ?Sized>(&self, storage: &S) -> Result<usize, StorageError> {
        let front = self.front_index(storage)? as i64;
        let back = self.back_index(storage)? as i64;
        Ok((back - front + 1).max(0) as usize)
    }

    pub fn is_empty<S: Storage + ?Sized>(&self, storage: &S) -> Result<bool, StorageError> {
        Ok(self.len(storage)? == 0)
    }

    pub fn push_front<S: Storage + ?Sized>(&self, storage: &S, value: &V) -> Result<(), StorageError> {
        let front = self
            .front_index(storage)?
            .checked_sub(1)
            .ok_or_else(|| StorageError::IndexExhausted(self.front_key()))?;
        storage.set_value(&self.element_key(front), value)?;
        storage.set_value(&self.front_key(), &front)
    }

    pub fn pop_front<S: Storage + ?Sized>(&self, storage: &S) -> Result<Option<V>, StorageError> {
        if self.is_empty(storage)? {
            return Ok(None);
        }
        let front = self.front_index(storage)?;
        let next = front
            .checked_add(1)
            .ok_or_else(|| StorageError::IndexExhausted(self.front_key()))?;
        let key = self.element_key(front);
        let value = storage.get_some(&key)?;
        storage.delete(&key)?;
        storage.set_value(&self.front_key(), &next)?;
        Ok(Some(value))
    }

    pub fn pop_back<S: Storage + ?Sized>(&self, storage: &S) -> Result<Option<V>, StorageError> {
        if self.is_empty(storage)? {
            return Ok(None);
        }
        let back = self.back_index(storage)?;
        let next = back
            .checked_sub(1)
            .ok_or_else(|| StorageError::IndexExhausted(self.back_key()))?;
        let key = self.element_key(back);
        let value = storage.get_some(&key)?;
        storage.delete(&key)?;
        storage.set_value(&self.back_key(), &next)?;
        Ok(Some(value))
    }

    pub fn front<S: Storage + ?Sized>(&self, storage: &S) -> Result<Option<V>, StorageError> {
        if self.is_empty(storage)? {
            return Ok(None);
        }
        storage.get_value(&self.element_key(self.front_index(storage)?))
    }

    pub fn back<S: Storage + ?Sized>(&self, storage: &S) -> Result<Option<V>, StorageError> {
        if self.is_empty(storage)? {
            return Ok(None);
        }
        storage.get_value(&self.element_key(self.back_index(storage)?))
    }

    /// Up to `limit` elements starting at the front, without removing them.
    pub fn range_from_front<S: Storage + ?Sized>(
        &self,
        storage: &S,
        limit: usize,
    ) -> Result<Vec<V>, StorageError> {
        let front = self.front_index(storage)?;
        let count = self.len(storage)?.min(limit);
        (0..count)
            .map(|offset| storage.get_some(&self.element_key(front + offset as i32)))
            .collect()
    }
}
