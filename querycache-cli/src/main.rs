//! QueryCache replay entry point.

use clap::Parser;
use querycache_cli::{init_telemetry, run, CliError, ReplayArgs, TelemetryConfig};

fn main() -> Result<(), CliError> {
    init_telemetry(&TelemetryConfig::default())?;
    let args = ReplayArgs::parse();
    let output = run(&args).inspect_err(|err| tracing::error!(error = %err, "Replay failed"))?;
    println!("{}", output);
    Ok(())
}
