//! Key management command.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use poa_core::Keypair;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    command: KeysCommand,
}

#[derive(Subcommand)]
enum KeysCommand {
    /// Generate a new keypair
    New {
        /// Name for the keypair file
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List all keypairs
    List,
}

pub fn run(args: KeysArgs, data_dir: &Path) -> Result<()> {
    match args.command {
        KeysCommand::New { name } => new_keypair(data_dir, name),
        KeysCommand::List => list_keypairs(data_dir),
    }
}

fn new_keypair(data_dir: &Path, name: Option<String>) -> Result<()> {
    let keypair = Keypair::generate();
    let address = keypair.address();
    let name = name.unwrap_or_else(|| format!("key_{}", &address.to_hex()[2..10]));
    let key_file = save_keypair(&keys_dir(data_dir), &name, &keypair)?;

    println!("{}", "Generated new keypair:".bold().cyan());
    println!();
    println!("  Address:     {}", address.to_hex().bright_yellow());
    println!(
        "  Public Key:  {}",
        hex::encode(keypair.public_key.as_bytes()).bright_black()
    );
    println!();
    println!(
        "{}  Saved to: {}",
        "✓".green().bold(),
        key_file.display().to_string().bright_black()
    );
    println!();
    println!("{}", "Keep your private key safe!".yellow().bold());

    Ok(())
}

fn list_keypairs(data_dir: &Path) -> Result<()> {
    let dir = keys_dir(data_dir);
    if !dir.exists() {
        println!("No keypairs found in {}", dir.display());
        return Ok(());
    }

    let mut names: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();

    println!("{}", "Keypairs:".bold().cyan());
    for name in names {
        match load_keypair(&dir, &name) {
            Ok(keypair) => println!(
                "  {:<20} {}",
                name.bright_white(),
                keypair.address().to_hex().bright_yellow()
            ),
            Err(e) => println!("  {:<20} {}", name.bright_white(), e.to_string().red()),
        }
    }

    Ok(())
}

/// Directory key files live in.
pub(crate) fn keys_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("keys")
}

/// Write `keypair` to `<keys_dir>/<name>.json`.
pub(crate) fn save_keypair(keys_dir: &Path, name: &str, keypair: &Keypair) -> Result<PathBuf> {
    fs::create_dir_all(keys_dir)
        .with_context(|| format!("Failed to create key directory: {}", keys_dir.display()))?;

    let key_file = keys_dir.join(format!("{}.json", name));
    if key_file.exists() {
        bail!("Keypair file already exists: {}", key_file.display());
    }
    let key_json = serde_json::json!({
        "address": keypair.address().to_hex(),
        "public_key": hex::encode(keypair.public_key.as_bytes()),
        "private_key": hex::encode(keypair.private_key()),
    });
    fs::write(&key_file, serde_json::to_string_pretty(&key_json)?)?;
    Ok(key_file)
}

/// Read `<keys_dir>/<name>.json`.
pub(crate) fn load_keypair(keys_dir: &Path, name: &str) -> Result<Keypair> {
    let key_file = keys_dir.join(format!("{}.json", name));
    if !key_file.exists() {
        bail!(
            "Keypair file not found: {}. Use 'poa keys new' to create one.",
            key_file.display()
        );
    }

    let contents = fs::read_to_string(&key_file)?;
    let json: serde_json::Value = serde_json::from_str(&contents)?;

    let private_key_hex = json
        .get("private_key")
        .and_then(|v| v.as_str())
        .context("Missing private_key in keypair file")?;

    let private_key_bytes = hex::decode(private_key_hex).context("Invalid private key hex")?;
    let private_key: [u8; 32] = private_key_bytes.as_slice().try_into().with_context(|| {
        format!(
            "Invalid private key length: expected 32 bytes, got {}",
            private_key_bytes.len()
        )
    })?;

    Ok(Keypair::from_private_key(&private_key))
}
