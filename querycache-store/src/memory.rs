//! In-memory query store.

use chrono::{DateTime, Utc};
use querycache_core::{CacheResult, CacheValue, QueryKey};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::{EntryUpdater, QueryStore};

/// One cached snapshot and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreEntry {
    pub value: CacheValue,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}

impl StoreEntry {
    fn fresh(value: CacheValue) -> Self {
        Self {
            value,
            stale: false,
            updated_at: Utc::now(),
        }
    }
}

/// Lock-guarded map of entries.
///
/// The write lock is held while an updater runs, so an updater (or a
/// predicate it calls) must not re-enter the same store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryQueryStore {
    entries: Arc<RwLock<HashMap<QueryKey, StoreEntry>>>,
}

impl InMemoryQueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking updater unwinds before the map is touched, so a poisoned
    // lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<QueryKey, StoreEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<QueryKey, StoreEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a snapshot directly, as a completed fetch would.
    pub fn seed(&self, key: QueryKey, value: impl Into<CacheValue>) -> CacheResult<()> {
        self.write().insert(key, StoreEntry::fresh(value.into()));
        Ok(())
    }

    pub fn get(&self, key: &QueryKey) -> CacheResult<Option<CacheValue>> {
        Ok(self.read().get(key).map(|entry| entry.value.clone()))
    }

    pub fn entry(&self, key: &QueryKey) -> CacheResult<Option<StoreEntry>> {
        Ok(self.read().get(key).cloned())
    }

    /// False for absent keys.
    pub fn is_stale(&self, key: &QueryKey) -> CacheResult<bool> {
        Ok(self.read().get(key).is_some_and(|entry| entry.stale))
    }

    pub fn len(&self) -> CacheResult<usize> {
        Ok(self.read().len())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.read().is_empty())
    }

    /// Drop every entry.
    pub fn clear(&self) -> CacheResult<()> {
        self.write().clear();
        Ok(())
    }
}

impl QueryStore for InMemoryQueryStore {
    fn set_entry(&self, key: &QueryKey, updater: &mut EntryUpdater<'_>) -> CacheResult<()> {
        let mut entries = self.write();
        let next = updater(entries.get(key).map(|entry| &entry.value))?;
        if let Some(value) = next {
            entries.insert(key.clone(), StoreEntry::fresh(value));
        }
        Ok(())
    }

    fn mark_stale(&self, key: &QueryKey) -> CacheResult<bool> {
        let mut entries = self.write();
        Ok(match entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        })
    }
}
