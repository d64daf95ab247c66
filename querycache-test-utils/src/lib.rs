//! QueryCache Test Utilities
//!
//! Centralized test infrastructure for the QueryCache workspace:
//! - A store double that fails for chosen keys
//! - Proptest generators for items, envelopes and keys
//! - Test fixtures for common cache shapes
//! - Custom assertions for page metadata and broadcast reports

// Re-export the in-memory store from its source crate
pub use querycache_store::{
    BroadcastReport, InMemoryQueryStore, KeyStatus, QueryCacheManager, QueryStore,
};

// Re-export core types for convenience
pub use querycache_core::{
    total_pages, CacheError, CacheManagerConfig, CacheResult, CacheValue, DataPath, ItemKey,
    PageInfo, QueryKey, SkipReason, StoreError,
};

use querycache_store::EntryUpdater;
use serde_json::json;
use std::collections::HashSet;

// ============================================================================
// FAILING STORE
// ============================================================================

/// Store double that fails every operation on selected keys and delegates
/// the rest to an [`InMemoryQueryStore`].
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: InMemoryQueryStore,
    failing: HashSet<QueryKey>,
}

impl FailingStore {
    pub fn new(inner: InMemoryQueryStore) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
        }
    }

    /// Make every operation on `key` fail.
    pub fn failing_on(mut self, key: QueryKey) -> Self {
        self.failing.insert(key);
        self
    }

    pub fn inner(&self) -> &InMemoryQueryStore {
        &self.inner
    }

    fn check(&self, key: &QueryKey) -> CacheResult<()> {
        if self.failing.contains(key) {
            return Err(StoreError::Backend {
                key: key.to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl QueryStore for FailingStore {
    fn set_entry(&self, key: &QueryKey, updater: &mut EntryUpdater<'_>) -> CacheResult<()> {
        self.check(key)?;
        self.inner.set_entry(key, updater)
    }

    fn mark_stale(&self, key: &QueryKey) -> CacheResult<bool> {
        self.check(key)?;
        self.inner.mark_stale(key)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating cache values and keys.

    use super::*;
    use proptest::prelude::*;

    /// Generate a numeric or string item key.
    pub fn arb_item_key() -> impl Strategy<Value = ItemKey> {
        prop_oneof![
            (0i64..10_000).prop_map(ItemKey::from),
            "[a-z0-9]{1,8}".prop_map(ItemKey::from),
        ]
    }

    /// Generate an item with the given numeric id.
    pub fn arb_item(id: i64) -> impl Strategy<Value = CacheValue> {
        ("[a-z ]{0,16}", any::<bool>())
            .prop_map(move |(title, done)| CacheValue::from(json!({"id": id, "title": title, "done": done})))
    }

    /// Generate up to `max` items with distinct numeric ids.
    pub fn arb_unique_items(max: usize) -> impl Strategy<Value = Vec<CacheValue>> {
        proptest::collection::hash_set(0i64..10_000, 0..max).prop_flat_map(|ids| {
            let mut ids: Vec<i64> = ids.into_iter().collect();
            ids.sort_unstable();
            ids.into_iter().map(arb_item).collect::<Vec<_>>()
        })
    }

    /// Generate a page size.
    pub fn arb_page_size() -> impl Strategy<Value = i64> {
        1i64..=50
    }

    /// Generate a paginated envelope whose page metadata is consistent and
    /// whose `totalElements` is at least the number of items on the page.
    pub fn arb_paginated_envelope() -> impl Strategy<Value = CacheValue> {
        (arb_unique_items(20), arb_page_size(), 0i64..200).prop_map(|(items, size, extra)| {
            fixtures::paginated(items, size, extra)
        })
    }

    /// Generate a query key of one to three parts, the last optionally an
    /// object of filters.
    pub fn arb_query_key() -> impl Strategy<Value = QueryKey> {
        (
            proptest::collection::vec("[a-z]{1,8}", 1..3),
            proptest::option::of((0i64..100, "[a-z]{1,6}")),
        )
            .prop_map(|(names, filter)| {
                let mut parts: Vec<serde_json::Value> = names.into_iter().map(Into::into).collect();
                if let Some((page, status)) = filter {
                    parts.push(json!({"page": page, "status": status}));
                }
                QueryKey::new(parts)
            })
    }

    /// Generate a data path of up to three segments.
    pub fn arb_data_path() -> impl Strategy<Value = DataPath> {
        proptest::collection::vec("[a-z]{1,6}", 0..3).prop_map(DataPath::new)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built cache values for common testing scenarios.

    use super::*;

    /// A todo item.
    pub fn todo(id: i64, title: &str) -> CacheValue {
        CacheValue::from(json!({"id": id, "title": title}))
    }

    /// Todo items for the given ids, titled `todo-<id>`.
    pub fn todos(ids: &[i64]) -> Vec<CacheValue> {
        ids.iter().map(|id| todo(*id, &format!("todo-{}", id))).collect()
    }

    /// A plain list of todos.
    pub fn todo_list(ids: &[i64]) -> CacheValue {
        CacheValue::array(todos(ids))
    }

    /// A paginated envelope on page 0. `totalElements` is the item count
    /// plus `extra`, with `totalPages` consistent with it.
    pub fn paginated(items: Vec<CacheValue>, size: i64, extra: i64) -> CacheValue {
        let total_elements = items.len() as i64 + extra;
        let total = total_pages(total_elements, size).unwrap_or(0);
        let content: Vec<serde_json::Value> = items.iter().map(CacheValue::to_json).collect();
        CacheValue::from(json!({
            "content": content,
            "page": {
                "size": size,
                "number": 0,
                "totalElements": total_elements,
                "totalPages": total,
            }
        }))
    }

    /// A paginated page of todos, page size 10, with no further pages.
    pub fn paginated_todos(ids: &[i64]) -> CacheValue {
        paginated(todos(ids), 10, 0)
    }

    /// `inner` nested under `path` inside otherwise empty objects.
    pub fn nested(path: &DataPath, inner: CacheValue) -> CacheValue {
        path.set(&CacheValue::object(Default::default()), inner)
    }

    /// An in-memory store holding `entries`.
    pub fn seeded_store(entries: Vec<(QueryKey, CacheValue)>) -> InMemoryQueryStore {
        let store = InMemoryQueryStore::new();
        for (key, value) in entries {
            if let Err(err) = store.seed(key, value) {
                panic!("seeding fixture store failed: {}", err);
            }
        }
        store
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for QueryCache-specific validation.

    use super::*;

    /// Assert that the `page` of an envelope satisfies
    /// `totalPages == ceil(totalElements / size)`.
    #[track_caller]
    pub fn assert_page_consistent(envelope: &CacheValue) {
        let page = envelope
            .get("page")
            .unwrap_or_else(|| panic!("Envelope has no page: {}", envelope));
        let info = PageInfo::from_value(page)
            .unwrap_or_else(|err| panic!("Invalid page {}: {}", page, err));
        let expected = total_pages(info.total_elements, info.size)
            .unwrap_or_else(|err| panic!("Invalid page {}: {}", page, err));
        assert_eq!(
            info.total_pages, expected,
            "totalPages inconsistent with totalElements {} and size {}",
            info.total_elements, info.size
        );
    }

    /// Assert the `totalElements` of an envelope.
    #[track_caller]
    pub fn assert_total_elements(envelope: &CacheValue, expected: i64) {
        let total = envelope
            .get("page")
            .and_then(|page| page.get("totalElements"))
            .and_then(CacheValue::as_i64);
        assert_eq!(total, Some(expected), "Unexpected totalElements in {}", envelope);
    }

    /// Assert that no key failed.
    #[track_caller]
    pub fn assert_clean(report: &BroadcastReport) {
        let failures: Vec<String> = report
            .failures()
            .map(|outcome| format!("{}: {}", outcome.key, outcome.status))
            .collect();
        assert!(failures.is_empty(), "Expected no failures, got: {:?}", failures);
    }

    /// Assert that `key` was applied.
    #[track_caller]
    pub fn assert_applied(report: &BroadcastReport, key: &QueryKey) {
        match report.status_for(key) {
            Some(KeyStatus::Applied) => {}
            other => panic!("Expected {} applied, got: {:?}", key, other),
        }
    }

    /// Assert that `key` was skipped for `reason`.
    #[track_caller]
    pub fn assert_skipped(report: &BroadcastReport, key: &QueryKey, reason: SkipReason) {
        match report.status_for(key) {
            Some(KeyStatus::Skipped(actual)) if *actual == reason => {}
            other => panic!("Expected {} skipped ({}), got: {:?}", key, reason, other),
        }
    }

    /// Assert that `key` failed.
    #[track_caller]
    pub fn assert_failed(report: &BroadcastReport, key: &QueryKey) {
        match report.status_for(key) {
            Some(KeyStatus::Failed(_)) => {}
            other => panic!("Expected {} failed, got: {:?}", key, other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
