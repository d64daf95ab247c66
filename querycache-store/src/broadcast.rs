//! Multi-key broadcasting with per-key fault isolation.

use querycache_core::{CacheError, CacheResult, KeySet, MutationError, QueryKey, SkipReason};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// What happened to one key.
#[derive(Debug)]
pub enum KeyStatus {
    Applied,
    Skipped(SkipReason),
    Failed(CacheError),
}

impl KeyStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, KeyStatus::Failed(_))
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::Applied => f.write_str("applied"),
            KeyStatus::Skipped(reason) => write!(f, "skipped ({})", reason),
            KeyStatus::Failed(err) => write!(f, "failed ({})", err),
        }
    }
}

#[derive(Debug)]
pub struct KeyOutcome {
    pub key: QueryKey,
    pub status: KeyStatus,
}

/// Per-key outcomes of one broadcast, in key order.
#[derive(Debug)]
pub struct BroadcastReport {
    operation: &'static str,
    outcomes: Vec<KeyOutcome>,
}

impl BroadcastReport {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn outcomes(&self) -> &[KeyOutcome] {
        &self.outcomes
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, KeyStatus::Applied))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &KeyOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.status.is_failed())
    }

    /// True when no key failed. Skipped keys are not failures.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn status_for(&self, key: &QueryKey) -> Option<&KeyStatus> {
        self.outcomes
            .iter()
            .find(|outcome| &outcome.key == key)
            .map(|outcome| &outcome.status)
    }
}

/// Run `op` once per key, in order.
///
/// An error or a panic on one key is logged and recorded as `Failed`; the
/// remaining keys are still processed and nothing is rolled back.
pub fn apply_to_all_keys<F>(keys: &KeySet, operation: &'static str, mut op: F) -> BroadcastReport
where
    F: FnMut(&QueryKey) -> CacheResult<KeyStatus>,
{
    let outcomes = keys
        .iter()
        .map(|key| {
            let status = match panic::catch_unwind(AssertUnwindSafe(|| op(key))) {
                Ok(result) => result.unwrap_or_else(KeyStatus::Failed),
                Err(payload) => KeyStatus::Failed(
                    MutationError::Panicked {
                        message: panic_message(payload.as_ref()),
                    }
                    .into(),
                ),
            };
            match &status {
                KeyStatus::Applied => {
                    tracing::debug!(key = %key, operation, "cache entry updated");
                }
                KeyStatus::Skipped(reason) => {
                    tracing::debug!(key = %key, operation, reason = %reason, "cache entry skipped");
                }
                KeyStatus::Failed(err) => {
                    tracing::warn!(key = %key, operation, error = %err, "cache update failed");
                }
            }
            KeyOutcome {
                key: key.clone(),
                status,
            }
        })
        .collect();

    BroadcastReport {
        operation,
        outcomes,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
