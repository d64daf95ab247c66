//! Shape-aware mutation engine.
//!
//! The engine is stateless: it maps the snapshot currently cached under one
//! key to the snapshot that should replace it. It locates the addressed
//! sub-value with the configured [`DataPath`](crate::DataPath), classifies it
//! as a [`CacheData`] shape, applies the mutation, and re-embeds the result
//! with copy-on-write along the path.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{CacheManagerConfig, DeleteCountPolicy};
use crate::error::MutationError;
use crate::identity::{DeleteTarget, ItemMatcher, Predicate};
use crate::shape::CacheData;
use crate::value::{CacheValue, ObjectMap};

/// Where `create` places a new item in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    #[default]
    Start,
    End,
}

/// One logical data mutation.
#[derive(Clone)]
pub enum Mutation {
    Create {
        item: CacheValue,
        position: InsertPosition,
    },
    Update {
        partial: CacheValue,
        matcher: Option<Predicate>,
    },
    Delete {
        target: DeleteTarget,
        matcher: Option<Predicate>,
    },
    Replace {
        data: CacheValue,
    },
}

impl Mutation {
    /// Short operation name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
            Mutation::Replace { .. } => "replace",
        }
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Create { item, position } => f
                .debug_struct("Create")
                .field("item", item)
                .field("position", position)
                .finish(),
            Mutation::Update { partial, matcher } => f
                .debug_struct("Update")
                .field("partial", partial)
                .field("custom_matcher", &matcher.is_some())
                .finish(),
            Mutation::Delete { target, matcher } => f
                .debug_struct("Delete")
                .field("target", target)
                .field("custom_matcher", &matcher.is_some())
                .finish(),
            Mutation::Replace { data } => f.debug_struct("Replace").field("data", data).finish(),
        }
    }
}

/// Why a mutation left a key untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing is cached under the key.
    AbsentEntry,
    /// A paginated envelope was expected but the value has no `content` array.
    MalformedShape,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AbsentEntry => f.write_str("absent entry"),
            SkipReason::MalformedShape => f.write_str("malformed shape"),
        }
    }
}

/// Result of applying a mutation to one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Applied(CacheValue),
    Skipped(SkipReason),
}

/// Applies mutations according to a binding's configuration.
#[derive(Debug, Clone, Copy)]
pub struct MutationEngine<'a> {
    config: &'a CacheManagerConfig,
}

impl<'a> MutationEngine<'a> {
    pub fn new(config: &'a CacheManagerConfig) -> Self {
        Self { config }
    }

    /// Compute the snapshot that should replace `snapshot`.
    ///
    /// A missing or null snapshot is never populated.
    pub fn apply(
        &self,
        snapshot: Option<&CacheValue>,
        mutation: &Mutation,
    ) -> Result<MutationOutcome, MutationError> {
        let root = match snapshot {
            Some(root) if !root.is_null() => root,
            _ => return Ok(MutationOutcome::Skipped(SkipReason::AbsentEntry)),
        };
        let path = self.config.data_path();
        let shaped = match mutation {
            // Replace ignores the current shape.
            Mutation::Replace { .. } => None,
            _ => CacheData::classify(path.get(root), self.config.is_paginated()),
        };

        let updated = match (mutation, shaped) {
            (Mutation::Replace { data }, _) => data.clone(),
            (_, None) => return Ok(MutationOutcome::Skipped(SkipReason::MalformedShape)),
            (Mutation::Create { item, position }, Some(data)) => {
                self.create(data, item, *position)?.into_value()
            }
            (Mutation::Update { partial, matcher }, Some(data)) => {
                self.update(data, partial, matcher.as_ref())?.into_value()
            }
            (Mutation::Delete { target, matcher }, Some(data)) => {
                self.delete(data, target, matcher.as_ref())?.into_value()
            }
        };

        Ok(MutationOutcome::Applied(path.set(root, updated)))
    }

    fn create(
        &self,
        data: CacheData,
        item: &CacheValue,
        position: InsertPosition,
    ) -> Result<CacheData, MutationError> {
        Ok(match data {
            CacheData::Paginated(mut envelope) => {
                insert(&mut envelope.content, item, position);
                let page = envelope.page_info()?;
                let total_elements = adjust_count(page.total_elements, 1)?;
                envelope.set_page_info(page.with_total_elements(total_elements)?);
                CacheData::Paginated(envelope)
            }
            CacheData::Collection(mut items) => {
                insert(&mut items, item, position);
                CacheData::Collection(items)
            }
            // A singular target is replaced outright.
            CacheData::Single(_) => CacheData::Single(Some(item.clone())),
        })
    }

    fn update(
        &self,
        data: CacheData,
        partial: &CacheValue,
        custom: Option<&Predicate>,
    ) -> Result<CacheData, MutationError> {
        let patch = partial.as_object().ok_or(MutationError::PatchNotObject {
            found: partial.kind(),
        })?;
        let matcher = ItemMatcher::for_update(custom, self.config.identity(), partial);

        Ok(match data {
            CacheData::Paginated(mut envelope) => {
                envelope.content = merge_matching(envelope.content, patch, &matcher)?;
                CacheData::Paginated(envelope)
            }
            CacheData::Collection(items) => {
                CacheData::Collection(merge_matching(items, patch, &matcher)?)
            }
            CacheData::Single(current) => {
                CacheData::Single(Some(shallow_merge(current.as_ref(), patch)?))
            }
        })
    }

    fn delete(
        &self,
        data: CacheData,
        target: &DeleteTarget,
        custom: Option<&Predicate>,
    ) -> Result<CacheData, MutationError> {
        let matcher = ItemMatcher::for_delete(custom, self.config.identity(), target);

        Ok(match data {
            CacheData::Paginated(mut envelope) => {
                let before = envelope.content.len();
                envelope.content.retain(|item| !matcher.matches(item));
                let removed = (before - envelope.content.len()) as i64;

                let page = envelope.page_info()?;
                let decrement = match self.config.delete_count_policy() {
                    DeleteCountPolicy::Always => 1,
                    DeleteCountPolicy::OnRemoval => removed,
                };
                let total_elements = adjust_count(page.total_elements, -decrement)?.max(0);
                envelope.set_page_info(page.with_total_elements(total_elements)?);
                CacheData::Paginated(envelope)
            }
            CacheData::Collection(mut items) => {
                items.retain(|item| !matcher.matches(item));
                CacheData::Collection(items)
            }
            CacheData::Single(_) => CacheData::Single(None),
        })
    }
}

fn adjust_count(total_elements: i64, delta: i64) -> Result<i64, MutationError> {
    total_elements
        .checked_add(delta)
        .ok_or(MutationError::CountOverflow {
            total_elements,
            delta,
        })
}

fn insert(items: &mut Vec<CacheValue>, item: &CacheValue, position: InsertPosition) {
    match position {
        InsertPosition::Start => items.insert(0, item.clone()),
        InsertPosition::End => items.push(item.clone()),
    }
}

fn merge_matching(
    items: Vec<CacheValue>,
    patch: &ObjectMap,
    matcher: &ItemMatcher,
) -> Result<Vec<CacheValue>, MutationError> {
    items
        .into_iter()
        .map(|item| {
            if matcher.matches(&item) {
                shallow_merge(Some(&item), patch)
            } else {
                Ok(item)
            }
        })
        .collect()
}

/// Fields of `patch` override those of `base`. A null or absent base
/// merges as an empty object; any other non-object base is rejected.
fn shallow_merge(base: Option<&CacheValue>, patch: &ObjectMap) -> Result<CacheValue, MutationError> {
    let mut merged = match base {
        None | Some(CacheValue::Null) => ObjectMap::new(),
        Some(CacheValue::Object(map)) => ObjectMap::clone(map),
        Some(other) => {
            return Err(MutationError::MergeTargetNotObject {
                found: other.kind(),
            })
        }
    };
    for (field, value) in patch {
        merged.insert(field.clone(), value.clone());
    }
    Ok(CacheValue::object(merged))
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::key::QueryKey;
    use crate::pagination::total_pages;
    use proptest::prelude::*;
    use serde_json::json;

    fn envelope(ids: &[i64], size: i64, total_elements: i64) -> CacheValue {
        let content: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        CacheValue::from(json!({
            "content": content,
            "page": {
                "size": size,
                "number": 0,
                "totalElements": total_elements,
                "totalPages": total_pages(total_elements, size).unwrap(),
            }
        }))
    }

    fn page_counts(value: &CacheValue) -> (i64, i64) {
        let page = value.get("page").unwrap();
        (
            page.get("totalElements").unwrap().as_i64().unwrap(),
            page.get("totalPages").unwrap().as_i64().unwrap(),
        )
    }

    fn config() -> CacheManagerConfig {
        CacheManagerConfig::new(QueryKey::from("items"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Create bumps totalElements by one and keeps totalPages consistent.
        #[test]
        fn prop_create_keeps_page_count_consistent(
            ids in proptest::collection::vec(0i64..1000, 0..20),
            size in 1i64..50,
            extra in 0i64..500,
            at_end in any::<bool>(),
        ) {
            let total = ids.len() as i64 + extra;
            let entry = envelope(&ids, size, total);
            let position = if at_end { InsertPosition::End } else { InsertPosition::Start };
            let config = config();
            let out = MutationEngine::new(&config)
                .apply(Some(&entry), &Mutation::Create { item: CacheValue::from(json!({"id": -1})), position })
                .unwrap();
            let MutationOutcome::Applied(out) = out else { panic!("expected applied") };
            let (elements, pages) = page_counts(&out);
            prop_assert_eq!(elements, total + 1);
            prop_assert_eq!(pages, (total + 1 + size - 1) / size);
            prop_assert_eq!(out.get("content").unwrap().as_array().unwrap().len(), ids.len() + 1);
        }

        /// Delete decrements totalElements by one, clamped at zero, whether or not anything matched.
        #[test]
        fn prop_delete_always_decrements(
            ids in proptest::collection::vec(0i64..50, 0..20),
            target in 0i64..100,
            size in 1i64..50,
            total in 0i64..200,
        ) {
            let entry = envelope(&ids, size, total);
            let config = config();
            let out = MutationEngine::new(&config)
                .apply(Some(&entry), &Mutation::Delete { target: DeleteTarget::from(target), matcher: None })
                .unwrap();
            let MutationOutcome::Applied(out) = out else { panic!("expected applied") };
            let (elements, pages) = page_counts(&out);
            let expected = (total - 1).max(0);
            prop_assert_eq!(elements, expected);
            prop_assert_eq!(pages, total_pages(expected, size).unwrap());
            let remaining = out.get("content").unwrap().as_array().unwrap();
            prop_assert!(remaining.iter().all(|item| item.get("id").unwrap().as_i64() != Some(target)));
        }

        /// Update with a matcher that matches nothing leaves the entry value-equal.
        #[test]
        fn prop_update_without_match_is_value_equal(
            ids in proptest::collection::vec(0i64..1000, 0..20),
            size in 1i64..50,
        ) {
            let entry = envelope(&ids, size, ids.len() as i64);
            let config = config();
            let never: Predicate = std::sync::Arc::new(|_: &CacheValue| false);
            let out = MutationEngine::new(&config)
                .apply(Some(&entry), &Mutation::Update { partial: CacheValue::from(json!({"x": 1})), matcher: Some(never) })
                .unwrap();
            prop_assert_eq!(out, MutationOutcome::Applied(entry));
        }

        /// Replace is idempotent.
        #[test]
        fn prop_replace_is_idempotent(
            ids in proptest::collection::vec(0i64..1000, 0..10),
            payload in proptest::collection::vec(0i64..1000, 0..10),
        ) {
            let entry = envelope(&ids, 10, ids.len() as i64);
            let config = config().with_data_path(["content"]);
            let engine = MutationEngine::new(&config);
            let mutation = Mutation::Replace { data: CacheValue::from(json!(payload)) };

            let MutationOutcome::Applied(once) = engine.apply(Some(&entry), &mutation).unwrap() else {
                panic!("expected applied")
            };
            let MutationOutcome::Applied(twice) = engine.apply(Some(&once), &mutation).unwrap() else {
                panic!("expected applied")
            };
            prop_assert_eq!(once, twice);
        }
    }
}
