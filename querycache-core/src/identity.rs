//! Item identity and matching.
//!
//! Items inside a collection are "the same logical item" when an
//! [`IdentityExtractor`] derives equal [`ItemKey`]s for them, unless the
//! caller supplies its own predicate.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;
use std::sync::Arc;

use crate::value::CacheValue;

/// Scalar identity of a cached item. Numbers never equal strings.
///
/// Integral floats compare equal to the matching integer once normalized,
/// so `1.0` and `1` identify the same item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Number(Number),
    Text(String),
}

impl ItemKey {
    /// Read a scalar key out of a value. Only numbers and strings qualify.
    pub fn from_value(value: &CacheValue) -> Option<Self> {
        match value {
            CacheValue::Number(n) => Some(ItemKey::Number(normalize_number(n))),
            CacheValue::String(s) => Some(ItemKey::Text(s.to_string())),
            _ => None,
        }
    }

    /// The same key with an integral float rewritten as an integer.
    pub fn normalized(self) -> Self {
        match self {
            ItemKey::Number(n) => ItemKey::Number(normalize_number(&n)),
            text => text,
        }
    }
}

fn normalize_number(n: &Number) -> Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Number(n) => write!(f, "{}", n),
            ItemKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(n: i64) -> Self {
        ItemKey::Number(Number::from(n))
    }
}

impl From<u64> for ItemKey {
    fn from(n: u64) -> Self {
        ItemKey::Number(Number::from(n))
    }
}

impl From<i32> for ItemKey {
    fn from(n: i32) -> Self {
        ItemKey::Number(Number::from(n))
    }
}

impl From<&str> for ItemKey {
    fn from(s: &str) -> Self {
        ItemKey::Text(s.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(s: String) -> Self {
        ItemKey::Text(s)
    }
}

/// Derives the identity of an item.
pub trait IdentityExtractor: Send + Sync {
    /// Return the item's identity, or `None` if it has none.
    fn extract(&self, item: &CacheValue) -> Option<ItemKey>;
}

impl<F> IdentityExtractor for F
where
    F: Fn(&CacheValue) -> Option<ItemKey> + Send + Sync,
{
    fn extract(&self, item: &CacheValue) -> Option<ItemKey> {
        self(item)
    }
}

/// Identity read from the first present, non-null field of a list.
///
/// The default list is `["id", "_id"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIdentity {
    fields: Vec<String>,
}

impl FieldIdentity {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Default for FieldIdentity {
    fn default() -> Self {
        Self::new(["id", "_id"])
    }
}

impl IdentityExtractor for FieldIdentity {
    fn extract(&self, item: &CacheValue) -> Option<ItemKey> {
        self.fields
            .iter()
            .filter_map(|field| item.get(field))
            .find(|value| !value.is_null())
            .and_then(ItemKey::from_value)
    }
}

/// Caller-supplied matching predicate.
pub type Predicate = Arc<dyn Fn(&CacheValue) -> bool + Send + Sync>;

/// The target of a delete: a full item or a bare id.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Item(CacheValue),
    Id(ItemKey),
}

impl From<CacheValue> for DeleteTarget {
    /// Numbers and strings are taken as bare ids; anything else as an item.
    fn from(value: CacheValue) -> Self {
        match ItemKey::from_value(&value) {
            Some(key) => DeleteTarget::Id(key),
            None => DeleteTarget::Item(value),
        }
    }
}

impl From<ItemKey> for DeleteTarget {
    fn from(key: ItemKey) -> Self {
        DeleteTarget::Id(key)
    }
}

impl From<i64> for DeleteTarget {
    fn from(n: i64) -> Self {
        DeleteTarget::Id(n.into())
    }
}

impl From<&str> for DeleteTarget {
    fn from(s: &str) -> Self {
        DeleteTarget::Id(s.into())
    }
}

/// Decides which collection elements an update or delete applies to.
#[derive(Clone)]
pub enum ItemMatcher {
    /// Caller predicate, used as-is.
    Custom(Predicate),
    /// Items whose extracted identity equals `key`. A `None` key matches
    /// nothing.
    Identity {
        extractor: Arc<dyn IdentityExtractor>,
        key: Option<ItemKey>,
    },
}

impl ItemMatcher {
    /// Matcher for an update, identifying items by the patch itself.
    pub fn for_update(
        custom: Option<&Predicate>,
        extractor: &Arc<dyn IdentityExtractor>,
        partial: &CacheValue,
    ) -> Self {
        match custom {
            Some(predicate) => ItemMatcher::Custom(Arc::clone(predicate)),
            None => ItemMatcher::Identity {
                extractor: Arc::clone(extractor),
                key: extractor.extract(partial).map(ItemKey::normalized),
            },
        }
    }

    /// Matcher for a delete. A bare id is compared directly against each
    /// item's extracted identity.
    pub fn for_delete(
        custom: Option<&Predicate>,
        extractor: &Arc<dyn IdentityExtractor>,
        target: &DeleteTarget,
    ) -> Self {
        if let Some(predicate) = custom {
            return ItemMatcher::Custom(Arc::clone(predicate));
        }
        let key = match target {
            DeleteTarget::Item(item) => extractor.extract(item).map(ItemKey::normalized),
            DeleteTarget::Id(id) => Some(id.clone().normalized()),
        };
        ItemMatcher::Identity {
            extractor: Arc::clone(extractor),
            key,
        }
    }

    pub fn matches(&self, item: &CacheValue) -> bool {
        match self {
            ItemMatcher::Custom(predicate) => predicate(item),
            ItemMatcher::Identity { extractor, key } => match key {
                Some(key) => extractor.extract(item).map(ItemKey::normalized).as_ref() == Some(key),
                None => false,
            },
        }
    }
}

impl fmt::Debug for ItemMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemMatcher::Custom(_) => f.write_str("ItemMatcher::Custom(..)"),
            ItemMatcher::Identity { key, .. } => f
                .debug_struct("ItemMatcher::Identity")
                .field("key", key)
                .finish(),
        }
    }
}
