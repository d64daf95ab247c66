//! Scripted replay of cache mutations.
//!
//! A replay seeds an in-memory store, binds one manager per binding of the
//! binding file, then applies each script step through the named binding's
//! manager. The final store is reported in seed order.

use querycache_core::{
    BindingsFile, CacheValue, ConfigError, DeleteTarget, InsertPosition, ItemKey, QueryKey,
};
use querycache_store::{BroadcastReport, InMemoryQueryStore, QueryCacheManager};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::args::ReplayArgs;
use crate::error::CliError;

/// One entry of the seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedEntry {
    pub key: QueryKey,
    pub value: CacheValue,
}

/// One entry of the script file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    pub binding: String,
    #[serde(flatten)]
    pub op: ScriptOp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    Create {
        item: CacheValue,
        #[serde(default)]
        position: InsertPosition,
    },
    Update {
        partial: CacheValue,
    },
    /// Exactly one of `id` and `item` must be given.
    Delete {
        #[serde(default)]
        id: Option<ItemKey>,
        #[serde(default)]
        item: Option<CacheValue>,
    },
    Replace {
        data: CacheValue,
    },
    Invalidate,
}

fn delete_target(id: &Option<ItemKey>, item: &Option<CacheValue>) -> Result<DeleteTarget, String> {
    match (id, item) {
        (Some(id), None) => Ok(DeleteTarget::Id(id.clone())),
        (None, Some(item)) => Ok(DeleteTarget::Item(item.clone())),
        _ => Err("delete needs exactly one of `id` or `item`".to_string()),
    }
}

/// One entry of the replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutput {
    pub key: QueryKey,
    pub stale: bool,
    pub value: CacheValue,
}

pub struct Replay {
    store: Arc<InMemoryQueryStore>,
    managers: HashMap<String, QueryCacheManager<InMemoryQueryStore>>,
    order: Vec<QueryKey>,
}

impl Replay {
    /// Seed a fresh store and bind a manager per binding. A key seeded twice
    /// keeps its first position and its last value.
    pub fn new(bindings: &BindingsFile, seed: Vec<SeedEntry>) -> Result<Self, CliError> {
        let store = Arc::new(InMemoryQueryStore::new());
        let mut order = Vec::new();
        for entry in seed {
            if !order.contains(&entry.key) {
                order.push(entry.key.clone());
            }
            store.seed(entry.key, entry.value)?;
        }

        let managers = bindings
            .bindings
            .iter()
            .map(|binding| {
                let manager = QueryCacheManager::new(Arc::clone(&store), binding.to_manager_config());
                (binding.name.clone(), manager)
            })
            .collect();

        Ok(Self {
            store,
            managers,
            order,
        })
    }

    /// Check every step before any is applied, then apply them in order.
    pub fn run_script(&self, steps: &[ScriptStep]) -> Result<Vec<BroadcastReport>, CliError> {
        for (index, step) in steps.iter().enumerate() {
            self.manager(&step.binding)?;
            if let ScriptOp::Delete { id, item } = &step.op {
                delete_target(id, item).map_err(|reason| CliError::InvalidStep { index, reason })?;
            }
        }
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    pub fn run_step(&self, index: usize, step: &ScriptStep) -> Result<BroadcastReport, CliError> {
        let manager = self.manager(&step.binding)?;
        let report = match &step.op {
            ScriptOp::Create { item, position } => manager.create_at(item.clone(), *position),
            ScriptOp::Update { partial } => manager.update(partial.clone()),
            ScriptOp::Delete { id, item } => {
                let target = delete_target(id, item)
                    .map_err(|reason| CliError::InvalidStep { index, reason })?;
                manager.delete(target)
            }
            ScriptOp::Replace { data } => manager.replace(data.clone()),
            ScriptOp::Invalidate => manager.invalidate(),
        };

        tracing::info!(
            step = index,
            binding = %step.binding,
            operation = report.operation(),
            applied = report.applied_count(),
            failed = report.failures().count(),
            "Script step replayed"
        );
        Ok(report)
    }

    /// Current entries in seed order.
    pub fn snapshot(&self) -> Result<Vec<EntryOutput>, CliError> {
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            if let Some(entry) = self.store.entry(key)? {
                out.push(EntryOutput {
                    key: key.clone(),
                    stale: entry.stale,
                    value: entry.value,
                });
            }
        }
        Ok(out)
    }

    fn manager(&self, binding: &str) -> Result<&QueryCacheManager<InMemoryQueryStore>, CliError> {
        self.managers.get(binding).ok_or_else(|| {
            ConfigError::UnknownBinding {
                name: binding.to_string(),
            }
            .into()
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the files named by `args`, replay the script and return the final
/// store as pretty-printed JSON.
pub fn run(args: &ReplayArgs) -> Result<String, CliError> {
    let bindings = BindingsFile::from_path(&args.config)?;
    let seed: Vec<SeedEntry> = read_json(&args.seed)?;
    let steps: Vec<ScriptStep> = read_json(&args.script)?;
    tracing::info!(
        bindings = bindings.bindings.len(),
        entries = seed.len(),
        steps = steps.len(),
        "Replay loaded"
    );

    let replay = Replay::new(&bindings, seed)?;
    replay.run_script(&steps)?;
    serde_json::to_string_pretty(&replay.snapshot()?).map_err(CliError::Output)
}
