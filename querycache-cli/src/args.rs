//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "querycache-replay")]
#[command(about = "Replay scripted cache mutations against seeded query results", long_about = None)]
#[command(version)]
pub struct ReplayArgs {
    /// Binding file (TOML)
    #[arg(long, env = "QUERYCACHE_CONFIG")]
    pub config: PathBuf,

    /// Seed entries (JSON)
    #[arg(long)]
    pub seed: PathBuf,

    /// Mutation script (JSON)
    #[arg(long)]
    pub script: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        ReplayArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_all_flags() {
        let parsed = ReplayArgs::try_parse_from([
            "querycache-replay",
            "--seed",
            "s.json",
            "--config",
            "b.toml",
            "--script",
            "x.json",
        ])
        .unwrap();
        assert_eq!(
            parsed,
            ReplayArgs {
                config: "b.toml".into(),
                seed: "s.json".into(),
                script: "x.json".into(),
            }
        );
    }

    #[test]
    fn test_config_reads_env_fallback() {
        let command = ReplayArgs::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new("QUERYCACHE_CONFIG")));
    }

    #[test]
    fn test_missing_script_is_rejected() {
        let err = ReplayArgs::try_parse_from([
            "querycache-replay",
            "--config",
            "b.toml",
            "--seed",
            "s.json",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_flag_without_value_is_rejected() {
        let err = ReplayArgs::try_parse_from(["querycache-replay", "--seed"]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidValue | ErrorKind::MissingRequiredArgument
        ));
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let err = ReplayArgs::try_parse_from([
            "querycache-replay",
            "--config",
            "b.toml",
            "--seed",
            "s.json",
            "--script",
            "x.json",
            "--verbose",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
