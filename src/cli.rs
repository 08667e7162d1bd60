use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Turbulence statistics for WRF model output and tower time series.
#[derive(Parser)]
#[command(
    name = "mmc",
    version,
    about = "Turbulence statistics for WRF model output and tower time series"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Analyse one WRF tslist tower.
    Tower(TowerArgs),
    /// Run the grid pipeline on a synthetic model field.
    Synthetic(SyntheticArgs),
}

/// Arguments for the `tower` subcommand.
#[derive(clap::Args)]
pub struct TowerArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "mmc.toml")]
    pub config: PathBuf,

    /// Common path prefix of the tower files, e.g. `run/T1.d02`.
    #[arg(short, long)]
    pub prefix: PathBuf,

    /// Path for the JSON summary (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `synthetic` subcommand.
#[derive(clap::Args)]
pub struct SyntheticArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "mmc.toml")]
    pub config: PathBuf,

    /// Override global RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Path for the JSON summary (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tower() {
        let cli = Cli::try_parse_from(["mmc", "-vv", "tower", "--prefix", "run/T1.d02"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Tower(args) = cli.command else {
            panic!("expected tower");
        };
        assert_eq!(args.config, PathBuf::from("mmc.toml"));
        assert_eq!(args.prefix, PathBuf::from("run/T1.d02"));
        assert!(args.output.is_none());
    }

    #[test]
    fn parse_synthetic() {
        let cli =
            Cli::try_parse_from(["mmc", "synthetic", "--seed", "11", "-o", "out.json"]).unwrap();
        let Command::Synthetic(args) = cli.command else {
            panic!("expected synthetic");
        };
        assert_eq!(args.seed, Some(11));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn tower_requires_prefix() {
        assert!(Cli::try_parse_from(["mmc", "tower"]).is_err());
    }
}
