//! Manager configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::identity::{FieldIdentity, IdentityExtractor};
use crate::key::KeySet;
use crate::path::DataPath;

/// How a paginated delete adjusts `totalElements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteCountPolicy {
    /// Decrement by one whether or not an item was removed.
    #[default]
    Always,
    /// Decrement by the number of items actually removed.
    OnRemoval,
}

/// Immutable configuration of one logical binding.
///
/// Defaults: paginated, root data path, identity from `id` then `_id`,
/// [`DeleteCountPolicy::Always`].
#[derive(Clone)]
pub struct CacheManagerConfig {
    keys: KeySet,
    paginated: bool,
    data_path: DataPath,
    identity: Arc<dyn IdentityExtractor>,
    delete_count: DeleteCountPolicy,
}

impl CacheManagerConfig {
    /// Create a config for a single key or a list of keys.
    pub fn new(keys: impl Into<KeySet>) -> Self {
        Self {
            keys: keys.into(),
            paginated: true,
            data_path: DataPath::root(),
            identity: Arc::new(FieldIdentity::default()),
            delete_count: DeleteCountPolicy::default(),
        }
    }

    /// Set whether the addressed value is a paginated envelope.
    pub fn with_paginated(mut self, paginated: bool) -> Self {
        self.paginated = paginated;
        self
    }

    /// Set the path to the mutable sub-value.
    pub fn with_data_path(mut self, path: impl Into<DataPath>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Set the identity extractor.
    pub fn with_identity(mut self, identity: impl IdentityExtractor + 'static) -> Self {
        self.identity = Arc::new(identity);
        self
    }

    /// Read identity from the first present, non-null field of `fields`.
    pub fn with_identity_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_identity(FieldIdentity::new(fields))
    }

    /// Set the delete count policy.
    pub fn with_delete_count_policy(mut self, policy: DeleteCountPolicy) -> Self {
        self.delete_count = policy;
        self
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    pub fn is_paginated(&self) -> bool {
        self.paginated
    }

    pub fn data_path(&self) -> &DataPath {
        &self.data_path
    }

    pub fn identity(&self) -> &Arc<dyn IdentityExtractor> {
        &self.identity
    }

    pub fn delete_count_policy(&self) -> DeleteCountPolicy {
        self.delete_count
    }
}

impl fmt::Debug for CacheManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManagerConfig")
            .field("keys", &self.keys)
            .field("paginated", &self.paginated)
            .field("data_path", &self.data_path)
            .field("delete_count", &self.delete_count)
            .finish_non_exhaustive()
    }
}
