//! Initialize governance state command.

use super::keys::{keys_dir, save_keypair};
use super::open_storage;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use poa_core::{GenesisState, Keypair};
use poa_keeper::Keeper;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct InitArgs {
    /// Genesis file (JSON) to initialize from
    #[arg(short, long)]
    genesis: Option<PathBuf>,

    /// Number of validators to generate when no genesis file is given
    #[arg(short, long, default_value = "1")]
    validators: usize,

    /// Voting power of each generated validator
    #[arg(short, long, default_value = "10")]
    power: u64,
}

pub fn run(args: InitArgs, data_dir: &Path) -> Result<()> {
    println!("{}", "Initializing PoA governance...".bold().cyan());
    println!();

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let genesis = match &args.genesis {
        Some(path) => read_genesis(path)?,
        None => generate_genesis(data_dir, args.validators, args.power)?,
    };

    let storage = open_storage(data_dir)?;
    let mut keeper = Keeper::new(&storage);
    keeper
        .init_genesis(&genesis)
        .context("Failed to initialize genesis state")?;
    storage.flush()?;

    let genesis_file = data_dir.join("genesis.json");
    fs::write(&genesis_file, serde_json::to_string_pretty(&genesis)?)?;

    println!(
        "{}  Initialized {} validators",
        "✓".green().bold(),
        genesis.validators.len().to_string().bright_cyan()
    );
    println!(
        "    Quorum: {}/{}, voting window: {} blocks, minimum active: {}",
        genesis.params.quorum.numerator,
        genesis.params.quorum.denominator,
        genesis.params.voting_window,
        genesis.params.min_active_validators
    );
    println!(
        "{}  Saved genesis to: {}",
        "✓".green().bold(),
        genesis_file.display().to_string().bright_black()
    );

    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to list validators",
        "poa query validators".bright_cyan()
    );
    println!(
        "  • Use {} to propose a new validator",
        "poa tx apply".bright_cyan()
    );

    Ok(())
}

fn read_genesis(path: &Path) -> Result<GenesisState> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read genesis file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid genesis file: {}", path.display()))
}

/// Generate validator keys and an equal-power genesis.
fn generate_genesis(data_dir: &Path, count: usize, power: u64) -> Result<GenesisState> {
    if count == 0 {
        bail!("At least one validator is required");
    }

    println!("{}", "Generating validators...".bold());
    let dir = keys_dir(data_dir);
    let mut addresses = Vec::with_capacity(count);
    for i in 0..count {
        let keypair = Keypair::generate();
        let key_file = save_keypair(&dir, &format!("validator_{}", i), &keypair)?;
        println!(
            "  Validator {}: {} ({})",
            i + 1,
            keypair.address().to_hex().bright_yellow(),
            key_file.display().to_string().bright_black()
        );
        addresses.push(keypair.address());
    }
    println!();

    Ok(GenesisState::with_validators(addresses, power))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::keys::load_keypair;

    #[test]
    fn test_generated_validators_have_key_files() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = generate_genesis(dir.path(), 3, 5).unwrap();

        assert_eq!(genesis.validators.len(), 3);
        assert!(genesis.validators.iter().all(|v| v.power == 5));
        let keypair = load_keypair(&keys_dir(dir.path()), "validator_2").unwrap();
        assert_eq!(keypair.address(), genesis.validators[2].address);

        assert!(generate_genesis(dir.path(), 0, 5).is_err());
    }

    #[test]
    fn test_read_genesis_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");
        fs::write(
            &path,
            r#"{
                "params": {
                    "quorum": { "numerator": 1, "denominator": 2 },
                    "voting_window": 20,
                    "min_active_validators": 1,
                    "admission_power": 5
                },
                "validators": [
                    { "address": "0x0101010101010101010101010101010101010101", "power": 7 }
                ]
            }"#,
        )
        .unwrap();

        let genesis = read_genesis(&path).unwrap();
        assert_eq!(genesis.params.voting_window, 20);
        assert_eq!(genesis.validators[0].power, 7);

        fs::write(&path, "{}").unwrap();
        assert!(read_genesis(&path).is_err());
    }
}
