//! Data paths into nested snapshots.
//!
//! [`DataPath::set`] is a persistent update: it copies the root and each
//! object on the path, then shares every other child with the input.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::value::{CacheValue, ObjectMap};

/// Field names locating the mutable sub-value inside an entry's root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPath(Vec<String>);

impl DataPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The empty path, addressing the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Walk the path. Returns `None` as soon as a level is missing or is not
    /// an object.
    pub fn get<'a>(&self, root: &'a CacheValue) -> Option<&'a CacheValue> {
        let mut current = root;
        for segment in &self.0 {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Return a new root with `value` placed at the path.
    ///
    /// Missing or non-object intermediate levels are replaced by fresh
    /// objects. The input is never modified.
    pub fn set(&self, root: &CacheValue, value: CacheValue) -> CacheValue {
        set_in(root, &self.0, value)
    }
}

fn set_in(node: &CacheValue, segments: &[String], value: CacheValue) -> CacheValue {
    let Some((head, rest)) = segments.split_first() else {
        return value;
    };

    let mut map = match node {
        CacheValue::Object(map) => ObjectMap::clone(map),
        _ => ObjectMap::new(),
    };

    let child = if rest.is_empty() {
        value
    } else {
        let current = map.get(head).cloned().unwrap_or_default();
        set_in(&current, rest, value)
    };

    map.insert(head.clone(), child);
    CacheValue::Object(Arc::new(map))
}

impl<S: Into<String>> FromIterator<S> for DataPath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<String>> for DataPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for DataPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}
