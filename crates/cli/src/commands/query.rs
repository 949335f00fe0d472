//! Query command.

use super::open_storage;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use poa_core::ProposalId;
use poa_query::{QueryProposalParams, QueryRoute, QueryService, QueryValidatorParams};
use std::path::Path;

#[derive(Args)]
pub struct QueryArgs {
    #[command(subcommand)]
    command: QueryCommand,
}

#[derive(Subcommand)]
enum QueryCommand {
    /// Query a validator
    Validator {
        /// Validator address (hex format)
        address: String,
    },
    /// Query all validators
    Validators,
    /// Query the params
    Params,
    /// Query the open applications to become a validator
    Applications,
    /// Query the open kick proposals to remove a validator
    KickProposals,
    /// Query an application by id, in any status
    Application { id: ProposalId },
    /// Query a kick proposal by id, in any status
    KickProposal { id: ProposalId },
}

pub fn run(args: QueryArgs, data_dir: &Path) -> Result<()> {
    let (route, request, subject) = request(args.command)?;

    let storage = open_storage(data_dir)?;
    let service = QueryService::new(&storage);

    match service.query(&route.path(), &request) {
        Ok(response) => {
            let value: serde_json::Value = serde_json::from_slice(&response)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Err(e) => {
            tracing::debug!(error = %e, "query failed");
            let line = match subject {
                Some(subject) => format!("could not resolve {} {}", route, subject),
                None => format!("could not resolve {}", route),
            };
            println!("{}", line.yellow());
        }
    }
    Ok(())
}

/// Route, JSON request body and the subject to mention on failure.
fn request(command: QueryCommand) -> Result<(QueryRoute, Vec<u8>, Option<String>)> {
    let proposal = |id: ProposalId| serde_json::to_vec(&QueryProposalParams { id });

    Ok(match command {
        QueryCommand::Validator { address } => {
            let body = serde_json::to_vec(&QueryValidatorParams {
                validator_addr: address.clone(),
            })?;
            (QueryRoute::Validator, body, Some(address))
        }
        QueryCommand::Validators => (QueryRoute::Validators, Vec::new(), None),
        QueryCommand::Params => (QueryRoute::Params, Vec::new(), None),
        QueryCommand::Applications => (QueryRoute::Applications, Vec::new(), None),
        QueryCommand::KickProposals => (QueryRoute::KickProposals, Vec::new(), None),
        QueryCommand::Application { id } => {
            (QueryRoute::Application, proposal(id)?, Some(id.to_string()))
        }
        QueryCommand::KickProposal { id } => {
            (QueryRoute::KickProposal, proposal(id)?, Some(id.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_request_body() {
        let (route, body, subject) = request(QueryCommand::Validator {
            address: "0xabc".to_string(),
        })
        .unwrap();
        assert_eq!(route, QueryRoute::Validator);
        assert_eq!(body, br#"{"validator_addr":"0xabc"}"#.to_vec());
        assert_eq!(subject.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_list_requests_have_no_body() {
        let (route, body, subject) = request(QueryCommand::KickProposals).unwrap();
        assert_eq!(route.path(), "custom/poa/kick-proposals");
        assert!(body.is_empty());
        assert!(subject.is_none());
    }
}
