//! QueryCache Core - Snapshot Values and the Mutation Engine
//!
//! Pure functions over immutable snapshots. Given the value cached under a
//! query key and one logical mutation (create, update, delete, replace),
//! the engine computes the value that should replace it. No storage and no
//! logging happen here; see `querycache-store` for both.

pub mod bindings;
pub mod config;
pub mod error;
pub mod identity;
pub mod key;
pub mod mutation;
pub mod pagination;
pub mod path;
pub mod shape;
pub mod value;

pub use bindings::{BindingSettings, BindingsFile};
pub use config::{CacheManagerConfig, DeleteCountPolicy};
pub use error::{CacheError, CacheResult, ConfigError, MutationError, StoreError};
pub use identity::{DeleteTarget, FieldIdentity, IdentityExtractor, ItemKey, ItemMatcher, Predicate};
pub use key::{KeySet, QueryKey};
pub use mutation::{InsertPosition, Mutation, MutationEngine, MutationOutcome, SkipReason};
pub use pagination::{total_pages, PageInfo};
pub use path::DataPath;
pub use shape::{CacheData, PaginatedEnvelope};
pub use value::{CacheValue, ObjectMap};
