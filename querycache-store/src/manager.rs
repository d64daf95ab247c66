//! Query cache manager.

use querycache_core::{
    CacheManagerConfig, CacheValue, DeleteTarget, InsertPosition, KeySet, Mutation,
    MutationEngine, MutationOutcome, Predicate, SkipReason,
};
use std::sync::Arc;

use crate::broadcast::{apply_to_all_keys, BroadcastReport, KeyStatus};
use crate::handlers::CacheHandlers;
use crate::traits::QueryStore;

/// Applies logical mutations to every key of one binding.
///
/// No operation returns an error: failures are isolated per key, logged, and
/// reported in the returned [`BroadcastReport`].
pub struct QueryCacheManager<S> {
    store: Arc<S>,
    config: CacheManagerConfig,
}

impl<S: QueryStore> QueryCacheManager<S> {
    pub fn new(store: Arc<S>, config: CacheManagerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CacheManagerConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeySet {
        self.config.keys()
    }

    /// Insert `item` at the start of each collection.
    pub fn create(&self, item: impl Into<CacheValue>) -> BroadcastReport {
        self.create_at(item, InsertPosition::Start)
    }

    pub fn create_at(&self, item: impl Into<CacheValue>, position: InsertPosition) -> BroadcastReport {
        self.apply(&Mutation::Create {
            item: item.into(),
            position,
        })
    }

    /// Merge `partial` into the items sharing its identity.
    pub fn update(&self, partial: impl Into<CacheValue>) -> BroadcastReport {
        self.apply(&Mutation::Update {
            partial: partial.into(),
            matcher: None,
        })
    }

    /// Merge `partial` into the items accepted by `matcher`.
    pub fn update_matching(&self, partial: impl Into<CacheValue>, matcher: Predicate) -> BroadcastReport {
        self.apply(&Mutation::Update {
            partial: partial.into(),
            matcher: Some(matcher),
        })
    }

    /// Remove the items identified by `target`, an item or a bare id.
    pub fn delete(&self, target: impl Into<DeleteTarget>) -> BroadcastReport {
        self.apply(&Mutation::Delete {
            target: target.into(),
            matcher: None,
        })
    }

    pub fn delete_matching(&self, target: impl Into<DeleteTarget>, matcher: Predicate) -> BroadcastReport {
        self.apply(&Mutation::Delete {
            target: target.into(),
            matcher: Some(matcher),
        })
    }

    /// Overwrite the addressed sub-value of every cached key.
    pub fn replace(&self, data: impl Into<CacheValue>) -> BroadcastReport {
        self.apply(&Mutation::Replace { data: data.into() })
    }

    /// Mark every bound key stale.
    pub fn invalidate(&self) -> BroadcastReport {
        apply_to_all_keys(self.config.keys(), "invalidate", |key| {
            Ok(if self.store.mark_stale(key)? {
                KeyStatus::Applied
            } else {
                KeyStatus::Skipped(SkipReason::AbsentEntry)
            })
        })
    }

    /// Apply one mutation to every bound key.
    pub fn apply(&self, mutation: &Mutation) -> BroadcastReport {
        let engine = MutationEngine::new(&self.config);
        tracing::trace!(?mutation, keys = self.config.keys().len(), "Broadcasting mutation");
        apply_to_all_keys(self.config.keys(), mutation.name(), |key| {
            let mut status = KeyStatus::Skipped(SkipReason::AbsentEntry);
            self.store.set_entry(key, &mut |snapshot| {
                Ok(match engine.apply(snapshot, mutation)? {
                    MutationOutcome::Applied(value) => {
                        status = KeyStatus::Applied;
                        Some(value)
                    }
                    MutationOutcome::Skipped(reason) => {
                        status = KeyStatus::Skipped(reason);
                        None
                    }
                })
            })?;
            Ok(status)
        })
    }
}

impl<S: QueryStore + 'static> QueryCacheManager<S> {
    /// Bundle the operations as named callbacks.
    pub fn handlers(self: &Arc<Self>) -> CacheHandlers {
        CacheHandlers::new(Arc::clone(self))
    }
}

impl<S> std::fmt::Debug for QueryCacheManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCacheManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
