//! CLI commands module.

use anyhow::{Context, Result};
use clap::Subcommand;
use poa_storage::Storage;
use std::path::Path;

mod init;
mod keys;
mod query;
mod tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize governance state from a genesis file
    Init(init::InitArgs),
    /// Key management
    Keys(keys::KeysArgs),
    /// Query governance state
    Query(query::QueryArgs),
    /// Sign and apply a governance transaction
    Tx(tx::TxArgs),
}

pub fn run(cmd: Commands, data_dir: &Path) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args, data_dir),
        Commands::Keys(args) => keys::run(args, data_dir),
        Commands::Query(args) => query::run(args, data_dir),
        Commands::Tx(args) => tx::run(args, data_dir),
    }
}

/// Open the database of an initialized data directory.
fn open_storage(data_dir: &Path) -> Result<Storage> {
    Storage::open(data_dir).with_context(|| {
        format!(
            "Failed to open storage at {}. Did you run 'poa init'?",
            data_dir.display()
        )
    })
}
