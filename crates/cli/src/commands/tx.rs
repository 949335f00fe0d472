//! Governance transaction command.
//!
//! Each invocation signs one message and applies it as the next block.

use super::keys::{keys_dir, load_keypair};
use super::open_storage;
use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use poa_core::{Address, Description, Msg, ProposalId, SignedMsg};
use poa_keeper::{BlockResult, Keeper};
use std::path::Path;

#[derive(Args)]
pub struct TxArgs {
    /// Signing keypair name (without .json extension)
    #[arg(short, long, global = true, default_value = "validator_0")]
    from: String,

    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Propose a candidate for admission
    Apply {
        /// Candidate address (hex format)
        candidate: String,

        /// Candidate display name
        #[arg(short, long, default_value = "")]
        moniker: String,
    },
    /// Vote on an open application
    Vote { id: ProposalId, decision: Decision },
    /// Propose removing a validator
    Kick {
        /// Validator address (hex format)
        target: String,
    },
    /// Vote on an open kick proposal
    VoteKick { id: ProposalId, decision: Decision },
}

#[derive(Clone, Copy, ValueEnum)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn approve(self) -> bool {
        matches!(self, Decision::Approve)
    }
}

pub fn run(args: TxArgs, data_dir: &Path) -> Result<()> {
    let keypair = load_keypair(&keys_dir(data_dir), &args.from)?;
    let signed = SignedMsg::new(build_msg(args.command)?, &keypair);

    let storage = open_storage(data_dir)?;
    let result = submit(&storage, &signed)?;
    storage.flush()?;

    print_result(&result);
    Ok(())
}

fn build_msg(command: TxCommand) -> Result<Msg> {
    Ok(match command {
        TxCommand::Apply { candidate, moniker } => Msg::SubmitApplication {
            candidate: parse_address(&candidate)?,
            description: Description::new(moniker),
        },
        TxCommand::Vote { id, decision } => Msg::VoteApplication {
            id,
            approve: decision.approve(),
        },
        TxCommand::Kick { target } => Msg::SubmitKickProposal {
            target: parse_address(&target)?,
        },
        TxCommand::VoteKick { id, decision } => Msg::VoteKickProposal {
            id,
            approve: decision.approve(),
        },
    })
}

fn parse_address(s: &str) -> Result<Address> {
    Address::from_hex(s).with_context(|| format!("Invalid address format: {}", s))
}

/// Apply `signed` as the block after the last applied one.
fn submit(storage: &poa_storage::Storage, signed: &SignedMsg) -> Result<BlockResult> {
    let mut keeper = Keeper::new(storage);
    let height = keeper.registry().last_height()?.map_or(1, |h| h + 1);
    keeper
        .apply_block(height, std::slice::from_ref(signed))
        .with_context(|| format!("Failed to apply block {}", height))
}

fn print_result(result: &BlockResult) {
    for receipt in &result.receipts {
        println!(
            "{} {} at height {}",
            receipt.msg.bold(),
            receipt.tx_hash[..16].bright_black(),
            result.height.to_string().bright_cyan()
        );
        match (&receipt.outcome, &receipt.error) {
            (Some(outcome), _) => {
                println!(
                    "{}  Proposal {} is {}",
                    "✓".green().bold(),
                    outcome.id.to_string().bright_yellow(),
                    outcome.status.to_string().bright_white()
                );
                if let Some(reason) = outcome.rejection {
                    println!("    Reason: {:?}", reason);
                }
                for event in &outcome.events {
                    println!("    {}", format!("{:?}", event).bright_black());
                }
            }
            (None, Some(error)) => {
                let kind = receipt
                    .error_kind
                    .map(|k| format!(" ({})", k))
                    .unwrap_or_default();
                println!("{}  {}{}", "✗".red().bold(), error.red(), kind);
            }
            (None, None) => {}
        }
    }
    for event in &result.events {
        println!("  {}", format!("{:?}", event).bright_black());
    }
}
