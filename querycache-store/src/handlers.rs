//! Named mutation callbacks.

use querycache_core::{CacheValue, DeleteTarget, InsertPosition, Mutation, Predicate};
use std::sync::Arc;

use crate::broadcast::BroadcastReport;
use crate::manager::QueryCacheManager;
use crate::traits::QueryStore;

type CreateHandler = Box<dyn Fn(CacheValue, InsertPosition) -> BroadcastReport + Send + Sync>;
type UpdateHandler = Box<dyn Fn(CacheValue, Option<Predicate>) -> BroadcastReport + Send + Sync>;
type DeleteHandler = Box<dyn Fn(DeleteTarget, Option<Predicate>) -> BroadcastReport + Send + Sync>;
type ReplaceHandler = Box<dyn Fn(CacheValue) -> BroadcastReport + Send + Sync>;
type InvalidateHandler = Box<dyn Fn() -> BroadcastReport + Send + Sync>;

/// A manager's operations bundled as callbacks, for wiring into the
/// success hooks of remote calls.
pub struct CacheHandlers {
    on_create: CreateHandler,
    on_update: UpdateHandler,
    on_delete: DeleteHandler,
    on_replace: ReplaceHandler,
    on_invalidate: InvalidateHandler,
}

impl CacheHandlers {
    pub(crate) fn new<S: QueryStore + 'static>(manager: Arc<QueryCacheManager<S>>) -> Self {
        let create = Arc::clone(&manager);
        let update = Arc::clone(&manager);
        let delete = Arc::clone(&manager);
        let replace = Arc::clone(&manager);
        Self {
            on_create: Box::new(move |item: CacheValue, position: InsertPosition| {
                create.create_at(item, position)
            }),
            on_update: Box::new(move |partial: CacheValue, matcher: Option<Predicate>| {
                update.apply(&Mutation::Update { partial, matcher })
            }),
            on_delete: Box::new(move |target: DeleteTarget, matcher: Option<Predicate>| {
                delete.apply(&Mutation::Delete { target, matcher })
            }),
            on_replace: Box::new(move |data: CacheValue| replace.replace(data)),
            on_invalidate: Box::new(move || manager.invalidate()),
        }
    }

    pub fn on_create(&self, item: impl Into<CacheValue>, position: InsertPosition) -> BroadcastReport {
        (self.on_create)(item.into(), position)
    }

    /// Without a matcher, items are matched by the identity of `partial`.
    pub fn on_update(&self, partial: impl Into<CacheValue>, matcher: Option<Predicate>) -> BroadcastReport {
        (self.on_update)(partial.into(), matcher)
    }

    pub fn on_delete(&self, target: impl Into<DeleteTarget>, matcher: Option<Predicate>) -> BroadcastReport {
        (self.on_delete)(target.into(), matcher)
    }

    pub fn on_replace(&self, data: impl Into<CacheValue>) -> BroadcastReport {
        (self.on_replace)(data.into())
    }

    pub fn on_invalidate(&self) -> BroadcastReport {
        (self.on_invalidate)()
    }
}

impl std::fmt::Debug for CacheHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandlers").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryQueryStore;
    use querycache_core::{CacheManagerConfig, QueryKey};
    use serde_json::json;

    #[test]
    fn test_handlers_forward_to_manager() {
        let key = QueryKey::from("todos");
        let store = Arc::new(InMemoryQueryStore::new());
        store.seed(key.clone(), json!([{"id": 1}])).unwrap();
        let manager = Arc::new(QueryCacheManager::new(
            Arc::clone(&store),
            CacheManagerConfig::new(key.clone()).with_paginated(false),
        ));
        let handlers = manager.handlers();

        handlers.on_create(json!({"id": 2}), InsertPosition::Start);
        handlers.on_create(json!({"id": 3}), InsertPosition::End);
        handlers.on_update(json!({"id": 1, "done": true}), None);
        assert_eq!(
            store.get(&key).unwrap().unwrap().to_json(),
            json!([{"id": 2}, {"id": 1, "done": true}, {"id": 3}])
        );

        handlers.on_delete(2_i64, None);
        assert_eq!(
            store.get(&key).unwrap().unwrap().to_json(),
            json!([{"id": 1, "done": true}, {"id": 3}])
        );

        handlers.on_replace(json!([]));
        assert_eq!(store.get(&key).unwrap().unwrap().to_json(), json!([]));

        let report = handlers.on_invalidate();
        assert_eq!(report.applied_count(), 1);
        assert!(store.is_stale(&key).unwrap());
    }

    #[test]
    fn test_handlers_accept_custom_matchers() {
        let key = QueryKey::from("todos");
        let store = Arc::new(InMemoryQueryStore::new());
        store
            .seed(
                key.clone(),
                json!([{"id": 1, "done": true}, {"id": 2, "done": false}, {"id": 3, "done": true}]),
            )
            .unwrap();
        let handlers = Arc::new(QueryCacheManager::new(
            Arc::clone(&store),
            CacheManagerConfig::new(key.clone()).with_paginated(false),
        ))
        .handlers();

        let done: Predicate =
            Arc::new(|item: &CacheValue| item.get("done") == Some(&CacheValue::Bool(true)));
        handlers.on_update(json!({"archived": true}), Some(Arc::clone(&done)));
        assert_eq!(
            store.get(&key).unwrap().unwrap().to_json(),
            json!([
                {"id": 1, "done": true, "archived": true},
                {"id": 2, "done": false},
                {"id": 3, "done": true, "archived": true}
            ])
        );

        handlers.on_delete(CacheValue::Null, Some(done));
        assert_eq!(
            store.get(&key).unwrap().unwrap().to_json(),
            json!([{"id": 2, "done": false}])
        );
    }

    #[test]
    fn test_handlers_outlive_caller_reference() {
        let key = QueryKey::from("todos");
        let store = Arc::new(InMemoryQueryStore::new());
        store.seed(key.clone(), json!([])).unwrap();
        let handlers = Arc::new(QueryCacheManager::new(
            Arc::clone(&store),
            CacheManagerConfig::new(key.clone()).with_paginated(false),
        ))
        .handlers();

        let report = std::thread::spawn(move || handlers.on_create(json!({"id": 1}), InsertPosition::Start))
            .join()
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(store.get(&key).unwrap().unwrap().to_json(), json!([{"id": 1}]));
    }
}
