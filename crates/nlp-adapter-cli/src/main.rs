use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use nlp_adapter::PopulationLayout;
use tracing::error;
use tracing_subscriber::EnvFilter;

use nlp_adapter_cli::cli::{Cli, Commands, ConfigCommands};

mod commands;

fn init_tracing(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Front {
            file,
            nx,
            nc,
            nf,
            format,
        } => commands::front::handle(file, PopulationLayout::new(*nx, *nc, *nf), *format),
        Commands::Backends { format } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::backends::handle(&config, *format)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { out } => commands::config::handle_init(out.as_deref()),
        },
        Commands::Violation { ineq, eq } => commands::violation::handle(&ineq.0, &eq.0),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
