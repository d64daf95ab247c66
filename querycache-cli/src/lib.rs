//! QueryCache Replay
//!
//! Loads a binding file, seeds an in-memory store and replays a script of
//! cache mutations against it.

pub mod args;
pub mod error;
pub mod replay;
pub mod telemetry;

pub use args::ReplayArgs;
pub use error::CliError;
pub use replay::{run, EntryOutput, Replay, ScriptOp, ScriptStep, SeedEntry};
pub use telemetry::{init_telemetry, TelemetryConfig};
