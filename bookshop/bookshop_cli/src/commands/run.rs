//! The `run` command.

use crate::simulation::Simulation;
use anyhow::Context;
use bookshop_core::StoreConfig;
use bookshop_store::{Snapshot, Store};
use clap::Args;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Store configuration file (TOML, or JSON by extension)
    #[clap(long)]
    pub config: PathBuf,

    /// Write the remaining inventory here on shutdown
    #[clap(long)]
    pub inventory_out: Option<PathBuf>,

    /// Write the filed receipts here on shutdown
    #[clap(long)]
    pub receipts_out: Option<PathBuf>,
}

/// Run the simulation to completion and print its summary
pub fn execute(args: &RunArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let store = Arc::new(Store::from_config(&config).context("failed to open the store")?);

    let summary = Simulation::new(Arc::clone(&store)).run()?;
    info!("Simulation finished: {:?}", summary);

    println!("orders completed: {}", summary.completed);
    println!("orders declined: {}", summary.declined);
    println!("deliveries: {}", summary.deliveries);
    println!("undelivered: {}", summary.undelivered);
    println!("total earnings: {}", store.register().total_earnings());

    let inventory_out = args
        .inventory_out
        .as_ref()
        .or(config.output.inventory.as_ref());
    if let Some(path) = inventory_out {
        store
            .inventory()
            .write_snapshot(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let receipts_out = args
        .receipts_out
        .as_ref()
        .or(config.output.receipts.as_ref());
    if let Some(path) = receipts_out {
        store
            .register()
            .write_snapshot(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}
