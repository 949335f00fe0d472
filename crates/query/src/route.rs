//! Query routes and request payloads.
//!
//! Routes have the form `custom/poa/<kind>`.

use crate::error::{QueryError, Result};
use poa_core::{Address, ProposalId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Module name used in query paths.
pub const MODULE: &str = "poa";

/// A read-only query the service can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRoute {
    Validator,
    Validators,
    Params,
    Applications,
    KickProposals,
    Application,
    KickProposal,
}

impl QueryRoute {
    pub const ALL: [QueryRoute; 7] = [
        QueryRoute::Validator,
        QueryRoute::Validators,
        QueryRoute::Params,
        QueryRoute::Applications,
        QueryRoute::KickProposals,
        QueryRoute::Application,
        QueryRoute::KickProposal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueryRoute::Validator => "validator",
            QueryRoute::Validators => "validators",
            QueryRoute::Params => "params",
            QueryRoute::Applications => "applications",
            QueryRoute::KickProposals => "kick-proposals",
            QueryRoute::Application => "application",
            QueryRoute::KickProposal => "kick-proposal",
        }
    }

    /// Full path, e.g. `custom/poa/validators`.
    pub fn path(&self) -> String {
        format!("custom/{}/{}", MODULE, self.name())
    }

    /// Parse a full query path.
    pub fn parse(path: &str) -> Result<Self> {
        let mut parts = path.split('/');
        let route = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("custom"), Some(MODULE), Some(kind), None) => {
                Self::ALL.into_iter().find(|r| r.name() == kind)
            }
            _ => None,
        };
        route.ok_or_else(|| QueryError::UnknownRoute(path.to_string()))
    }
}

impl fmt::Display for QueryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request body of the `validator` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorParams {
    /// Hex address, with or without `0x`.
    pub validator_addr: String,
}

impl QueryValidatorParams {
    pub fn new(address: &Address) -> Self {
        Self {
            validator_addr: address.to_hex(),
        }
    }

    /// Parse the address without touching storage.
    pub fn address(&self) -> Result<Address> {
        Address::from_hex(&self.validator_addr)
            .map_err(|_| QueryError::MalformedAddress(self.validator_addr.clone()))
    }
}

/// Request body of the `application` and `kick-proposal` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProposalParams {
    pub id: ProposalId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_parses_its_path() {
        for route in QueryRoute::ALL {
            assert_eq!(QueryRoute::parse(&route.path()).unwrap(), route);
        }
    }

    #[test]
    fn test_unknown_routes() {
        for path in [
            "custom/poa/unknown",
            "custom/bank/validators",
            "poa/validators",
            "custom/poa/validators/extra",
            "",
        ] {
            assert!(matches!(
                QueryRoute::parse(path),
                Err(QueryError::UnknownRoute(_))
            ));
        }
    }

    #[test]
    fn test_malformed_validator_address() {
        let params = QueryValidatorParams {
            validator_addr: "0xnothex".to_string(),
        };
        assert!(matches!(
            params.address(),
            Err(QueryError::MalformedAddress(_))
        ));

        let params = QueryValidatorParams::new(&Address([3; 20]));
        assert_eq!(params.address().unwrap(), Address([3; 20]));
    }
}
