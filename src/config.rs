use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{SimConfig, SimulationParams};

#[derive(Parser, Debug)]
#[command(name = "mmc-sim", version, about = "Discrete-event M/M/c queue simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(
        long,
        global = true,
        default_value = "warn",
        help = "Log level when RUST_LOG is unset (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation and print its results.
    Run(RunArgs),
    /// Print the resolved parameters without running.
    ShowConfig(ParamArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    #[arg(long, help = "TOML or JSON file; flags override its values")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Mean arrivals per minute")]
    pub arrival_rate: Option<f64>,
    #[arg(long, help = "Mean services per minute, per server")]
    pub service_rate: Option<f64>,
    #[arg(long = "servers", help = "Number of servers (1-20)")]
    pub num_servers: Option<usize>,
    #[arg(long, help = "Simulated minutes (at most 1440)")]
    pub duration: Option<f64>,
    #[arg(long, help = "Seed for the random source; defaults to 0")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub params: ParamArgs,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
    #[arg(
        long,
        conflicts_with = "format",
        help = "Stream start/progress/complete frames to stdout instead of formatted output"
    )]
    pub progress: bool,
    #[arg(
        long,
        requires = "progress",
        help = "Abort the run when a progress frame cannot be delivered"
    )]
    pub strict_progress: bool,
}

#[derive(ValueEnum, Clone, Debug, Eq, PartialEq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

pub fn parse_args() -> Result<Cli> {
    Cli::try_parse().map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Error::Cli(err.to_string()),
    })
}

/// Merges the optional config file with command-line flags and validates
/// the result.
pub fn resolve_params(args: &ParamArgs) -> Result<(SimulationParams, u64)> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if args.arrival_rate.is_some() {
        config.arrival_rate = args.arrival_rate;
    }
    if args.service_rate.is_some() {
        config.service_rate = args.service_rate;
    }
    if args.num_servers.is_some() {
        config.num_servers = args.num_servers;
    }
    if args.duration.is_some() {
        config.duration = args.duration;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.into_params()
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}
