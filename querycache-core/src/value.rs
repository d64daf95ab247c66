//! Snapshot value model.
//!
//! A [`CacheValue`] is a JSON-shaped tree whose containers sit behind `Arc`.
//! Cloning a value is cheap and never deep-copies: a rewritten snapshot only
//! allocates the containers it actually changes, and every untouched child
//! is the same allocation as in the previous snapshot. [`CacheValue::ptr_eq`]
//! exposes that sharing so callers can check it.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt;
use std::sync::Arc;

/// Insertion-ordered field map of an object value.
pub type ObjectMap = IndexMap<String, CacheValue>;

/// An immutable cached value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CacheValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Array(Arc<Vec<CacheValue>>),
    Object(Arc<ObjectMap>),
}

impl CacheValue {
    /// Build an object value from a field map.
    pub fn object(map: ObjectMap) -> Self {
        CacheValue::Object(Arc::new(map))
    }

    /// Build an array value from items.
    pub fn array(items: Vec<CacheValue>) -> Self {
        CacheValue::Array(Arc::new(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CacheValue::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            CacheValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CacheValue]> {
        match self {
            CacheValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            CacheValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    /// Look up a field of an object value.
    pub fn get(&self, field: &str) -> Option<&CacheValue> {
        self.as_object().and_then(|map| map.get(field))
    }

    /// Name of the JSON kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Null => "null",
            CacheValue::Bool(_) => "boolean",
            CacheValue::Number(_) => "number",
            CacheValue::String(_) => "string",
            CacheValue::Array(_) => "array",
            CacheValue::Object(_) => "object",
        }
    }

    /// True when both values are the same shared allocation.
    ///
    /// Scalars other than strings carry no allocation and never compare
    /// pointer-equal; use `==` for structural equality.
    pub fn ptr_eq(&self, other: &CacheValue) -> bool {
        match (self, other) {
            (CacheValue::Array(a), CacheValue::Array(b)) => Arc::ptr_eq(a, b),
            (CacheValue::Object(a), CacheValue::Object(b)) => Arc::ptr_eq(a, b),
            (CacheValue::String(a), CacheValue::String(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert into an owned `serde_json::Value` (deep copy).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CacheValue::Null => serde_json::Value::Null,
            CacheValue::Bool(b) => serde_json::Value::Bool(*b),
            CacheValue::Number(n) => serde_json::Value::Number(n.clone()),
            CacheValue::String(s) => serde_json::Value::String(s.to_string()),
            CacheValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(CacheValue::to_json).collect())
            }
            CacheValue::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CacheValue::Null,
            serde_json::Value::Bool(b) => CacheValue::Bool(b),
            serde_json::Value::Number(n) => CacheValue::Number(n),
            serde_json::Value::String(s) => CacheValue::String(Arc::from(s)),
            serde_json::Value::Array(items) => {
                CacheValue::array(items.into_iter().map(CacheValue::from).collect())
            }
            serde_json::Value::Object(map) => CacheValue::object(
                map.into_iter()
                    .map(|(k, v)| (k, CacheValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&CacheValue> for serde_json::Value {
    fn from(value: &CacheValue) -> Self {
        value.to_json()
    }
}

impl From<bool> for CacheValue {
    fn from(b: bool) -> Self {
        CacheValue::Bool(b)
    }
}

impl From<i64> for CacheValue {
    fn from(n: i64) -> Self {
        CacheValue::Number(Number::from(n))
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        CacheValue::String(Arc::from(s))
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        CacheValue::String(Arc::from(s))
    }
}

impl From<Vec<CacheValue>> for CacheValue {
    fn from(items: Vec<CacheValue>) -> Self {
        CacheValue::array(items)
    }
}

impl From<ObjectMap> for CacheValue {
    fn from(map: ObjectMap) -> Self {
        CacheValue::object(map)
    }
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for CacheValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CacheValue::Null => serializer.serialize_unit(),
            CacheValue::Bool(b) => serializer.serialize_bool(*b),
            CacheValue::Number(n) => n.serialize(serializer),
            CacheValue::String(s) => serializer.serialize_str(s),
            CacheValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            CacheValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CacheValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(CacheValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_roundtrip_preserves_structure() {
        let source = json!({"content": [{"id": 1}, {"id": "a", "tags": [true, null]}], "n": 2.5});
        let value = CacheValue::from(source.clone());
        assert_eq!(value.to_json(), source);
    }

    #[test]
    fn test_clone_shares_containers() {
        let value = CacheValue::from(json!({"items": [1, 2, 3]}));
        let copy = value.clone();
        assert!(value.ptr_eq(&copy));
        assert!(value.get("items").unwrap().ptr_eq(copy.get("items").unwrap()));
    }

    #[test]
    fn test_structurally_equal_values_are_not_ptr_eq() {
        let a = CacheValue::from(json!({"id": 1}));
        let b = CacheValue::from(json!({"id": 1}));
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_scalars_never_ptr_eq() {
        assert!(!CacheValue::from(1_i64).ptr_eq(&CacheValue::from(1_i64)));
        assert!(!CacheValue::Null.ptr_eq(&CacheValue::Null));
    }

    #[test]
    fn test_serde_matches_serde_json() {
        let value = CacheValue::from(json!({"b": 1, "a": [1, "x"]}));
        let encoded = serde_json::to_string(&value).unwrap();
        let decoded: CacheValue = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_object_preserves_insertion_order() {
        let mut map = ObjectMap::new();
        map.insert("z".to_string(), CacheValue::from(1_i64));
        map.insert("a".to_string(), CacheValue::from(2_i64));
        let value = CacheValue::object(map);
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CacheValue::Null.kind(), "null");
        assert_eq!(CacheValue::from("x").kind(), "string");
        assert_eq!(CacheValue::array(vec![]).kind(), "array");
    }
}
