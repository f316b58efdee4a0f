use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Adapter configuration file (TOML)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the first Pareto front of a population file
    Front {
        /// Population file written by the genetic backend
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Number of design variables
        #[arg(long)]
        nx: usize,
        /// Number of inequality constraints
        #[arg(long, default_value_t = 0)]
        nc: usize,
        /// Number of objectives
        #[arg(long)]
        nf: usize,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Print the effective backend quirk table
    Backends {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print the maximum constraint violation of the given values
    Violation {
        /// Inequality constraint values, comma separated
        #[arg(long, value_parser = parse_values, default_value = "", allow_hyphen_values = true)]
        ineq: Values,
        /// Equality constraint values, comma separated
        #[arg(long, value_parser = parse_values, default_value = "", allow_hyphen_values = true)]
        eq: Values,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration as TOML
    Init {
        /// Destination file (stdout when omitted)
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Comma-separated list of numbers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values(pub Vec<f64>);

/// Parse `"1.0, -2,3e-1"` into numbers. An empty string is an empty list.
pub fn parse_values(raw: &str) -> Result<Values, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|e| format!("invalid number `{field}`: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Values)
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
