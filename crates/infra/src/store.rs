//! Inventory store: latest raw record per warehouse.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use warehub_core::WarehouseKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Mapping from classification key to the most recently received raw record.
///
/// Entries are independent and only ever overwritten, never removed. Readers
/// may observe writes late; no ordering with concurrent `put`s is promised.
pub trait InventoryStore: Send + Sync {
    /// Overwrite whatever is stored under `key`.
    fn put(&self, key: WarehouseKey, value: String) -> Result<(), StoreError>;

    /// Owned snapshot of all current entries.
    fn get_all(&self) -> BTreeMap<WarehouseKey, String>;

    fn len(&self) -> usize {
        self.get_all().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn put(&self, key: WarehouseKey, value: String) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn get_all(&self) -> BTreeMap<WarehouseKey, String> {
        (**self).get_all()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Process-lifetime store guarded by an internal `RwLock`.
///
/// A writer panicking mid-`put` cannot leave an entry half-updated, so a
/// poisoned lock is recovered rather than reported.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    inner: RwLock<HashMap<WarehouseKey, String>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn put(&self, key: WarehouseKey, value: String) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key, value);
        Ok(())
    }

    fn get_all(&self) -> BTreeMap<WarehouseKey, String> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
