//! poa CLI entry point.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "poa")]
#[command(about = "Proof-of-Authority validator set governance", long_about = None)]
struct Cli {
    /// Directory holding the governance database and key files
    #[arg(long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd, &cli.data_dir) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("poa - Proof-of-Authority validator set governance");
            println!("Run 'poa --help' for usage information.");
        }
    }
}
