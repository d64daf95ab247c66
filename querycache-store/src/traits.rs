//! Store abstraction.

use querycache_core::{CacheResult, CacheValue, QueryKey};

/// Updater handed to [`QueryStore::set_entry`].
///
/// Receives the current snapshot (`None` when the key has no entry) and
/// returns the snapshot to install, or `None` to leave the entry untouched.
pub type EntryUpdater<'a> =
    dyn FnMut(Option<&CacheValue>) -> CacheResult<Option<CacheValue>> + 'a;

/// Keyed snapshot store with an atomic read-modify-write primitive.
///
/// Implementations must hand the updater a consistent prior value and
/// install its result atomically for that key. Nothing is required across
/// keys.
pub trait QueryStore: Send + Sync {
    /// Read-modify-write one entry.
    ///
    /// An error from the updater is returned unchanged and nothing is written.
    fn set_entry(&self, key: &QueryKey, updater: &mut EntryUpdater<'_>) -> CacheResult<()>;

    /// Mark an entry stale. Returns whether an entry was present.
    fn mark_stale(&self, key: &QueryKey) -> CacheResult<bool>;
}
