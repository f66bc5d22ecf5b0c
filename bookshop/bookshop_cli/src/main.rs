use bookshop_core::utils::{init_logger, LogLevel};
use clap::{Parser, Subcommand};

mod commands;
mod simulation;

use commands::check::CheckArgs;
use commands::run::RunArgs;

/// Bookshop simulation
///
/// Runs a store described by a configuration file: sellers take orders,
/// charge customers and hand books to a shared fleet of delivery vehicles.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Minimum level of log lines written to stderr
    #[clap(long, global = true, default_value = "warning")]
    log_level: LogLevel,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every order in the configuration and print a summary
    Run(RunArgs),

    /// Parse and validate a configuration file
    Check(CheckArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(&args),
        Commands::Check(args) => commands::check::execute(&args),
    }
}
