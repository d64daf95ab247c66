//! Query keys and key sets.
//!
//! A [`QueryKey`] is an ordered list of JSON parts, e.g. `["todos", {"page": 1}]`.
//! Two keys are equal when their parts are structurally equal. Object parts
//! compare independently of field order: equality and hashing go through a
//! canonical encoding with sorted field names.

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque identifier of one cache entry.
#[derive(Clone)]
pub struct QueryKey {
    parts: Arc<[Value]>,
    canonical: Arc<str>,
}

impl QueryKey {
    /// Build a key from its parts.
    pub fn new<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Value>,
    {
        let parts: Vec<Value> = parts.into_iter().map(Into::into).collect();
        let mut canonical = String::new();
        write_canonical(&Value::Array(parts.clone()), &mut canonical);
        Self {
            parts: parts.into(),
            canonical: canonical.into(),
        }
    }

    /// Build a key from a JSON value. An array supplies the parts; any other
    /// value becomes a single-part key.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(parts) => Self::new(parts),
            other => Self::new([other]),
        }
    }

    pub fn parts(&self) -> &[Value] {
        &self.parts
    }

    /// Canonical compact JSON encoding used for equality and hashing.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, item)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", self.canonical)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl From<&str> for QueryKey {
    fn from(s: &str) -> Self {
        Self::new([s])
    }
}

impl Serialize for QueryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.parts[..].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(QueryKey::from_json)
    }
}

/// Ordered, duplicate-free set of keys bound to one logical entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeySet {
    keys: IndexSet<QueryKey>,
}

impl KeySet {
    /// Normalize keys into a set, keeping first-seen order.
    pub fn new(keys: impl IntoIterator<Item = QueryKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, QueryKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.keys.contains(key)
    }
}

impl From<QueryKey> for KeySet {
    fn from(key: QueryKey) -> Self {
        Self::new([key])
    }
}

impl From<Vec<QueryKey>> for KeySet {
    fn from(keys: Vec<QueryKey>) -> Self {
        Self::new(keys)
    }
}

impl<const N: usize> From<[QueryKey; N]> for KeySet {
    fn from(keys: [QueryKey; N]) -> Self {
        Self::new(keys)
    }
}

impl FromIterator<QueryKey> for KeySet {
    fn from_iter<T: IntoIterator<Item = QueryKey>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a QueryKey;
    type IntoIter = indexmap::set::Iter<'a, QueryKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_object_parts_compare_structurally() {
        let a = QueryKey::from_json(json!(["todos", {"status": "open", "page": 1}]));
        let b = QueryKey::from_json(json!(["todos", {"page": 1, "status": "open"}]));
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_number_and_string_parts_differ() {
        let a = QueryKey::from_json(json!(["todo", 1]));
        let b = QueryKey::from_json(json!(["todo", "1"]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_scalar_json_becomes_single_part() {
        let key = QueryKey::from_json(json!("todos"));
        assert_eq!(key, QueryKey::from("todos"));
        assert_eq!(key.parts().len(), 1);
    }

    #[test]
    fn test_display_is_canonical_json() {
        let key = QueryKey::from_json(json!(["todos", {"b": 2, "a": 1}]));
        assert_eq!(key.to_string(), r#"["todos",{"a":1,"b":2}]"#);
    }

    #[test]
    fn test_key_set_single_key() {
        let set = KeySet::from(QueryKey::from("todos"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_key_set_dedupes_and_keeps_order() {
        let list = QueryKey::new(["todos", "list"]);
        let detail = QueryKey::new(["todos", "detail"]);
        let set = KeySet::from(vec![list.clone(), detail.clone(), list.clone()]);
        let keys: Vec<_> = set.iter().cloned().collect();
        assert_eq!(keys, vec![list, detail]);
    }

    #[test]
    fn test_key_deserializes_from_array() {
        let key: QueryKey = serde_json::from_str(r#"["todos", 3]"#).unwrap();
        assert_eq!(key, QueryKey::from_json(json!(["todos", 3])));
    }
}
