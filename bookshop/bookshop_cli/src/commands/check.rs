//! The `check` command.

use anyhow::Context;
use bookshop_core::StoreConfig;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Store configuration file (TOML, or JSON by extension)
    #[clap(long)]
    pub config: PathBuf,
}

/// Parse and validate the configuration, then print what it describes
pub fn execute(args: &CheckArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    config
        .validate()
        .with_context(|| format!("{} is not a valid store", args.config.display()))?;

    println!("configuration ok: {}", args.config.display());
    println!("books: {}", config.books.len());
    println!("vehicles: {}", config.vehicles.len());
    println!("customers: {}", config.customers.len());
    println!("orders: {}", config.order_count());
    Ok(())
}
