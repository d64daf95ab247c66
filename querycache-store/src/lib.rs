//! QueryCache Store - Store Trait, In-Memory Store and Cache Manager
//!
//! Defines the read-modify-write store abstraction and the manager that
//! broadcasts one logical mutation to every query key bound to an entity.

pub mod broadcast;
pub mod handlers;
pub mod manager;
pub mod memory;
pub mod traits;

pub use broadcast::{apply_to_all_keys, BroadcastReport, KeyOutcome, KeyStatus};
pub use handlers::CacheHandlers;
pub use manager::QueryCacheManager;
pub use memory::{InMemoryQueryStore, StoreEntry};
pub use traits::{EntryUpdater, QueryStore};
