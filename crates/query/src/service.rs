//! Read-only projections of governance state.

use crate::error::{QueryError, Result};
use crate::route::{QueryProposalParams, QueryRoute, QueryValidatorParams};
use poa_core::{Address, Application, KickProposal, Params, ProposalId, Validator};
use poa_storage::{Registry, Storage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Answers queries against the registry.
///
/// Holds only a shared borrow of the storage, so any number of services can
/// read concurrently while the keeper commits in batches.
pub struct QueryService<'a> {
    registry: Registry<'a>,
}

impl<'a> QueryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            registry: Registry::new(storage),
        }
    }

    /// A single validator, active or removed.
    pub fn validator(&self, address: &Address) -> Result<Validator> {
        self.registry
            .get_validator(address)?
            .ok_or_else(|| QueryError::NotFound(format!("validator {}", address)))
    }

    /// Every validator, ordered by address.
    pub fn validators(&self) -> Result<Vec<Validator>> {
        Ok(self.registry.list_validators()?)
    }

    /// Current governance parameters.
    pub fn params(&self) -> Result<Params> {
        self.registry
            .get_params()?
            .ok_or_else(|| QueryError::NotFound("params".to_string()))
    }

    /// Open applications, ordered by id.
    pub fn applications(&self) -> Result<Vec<Application>> {
        Ok(self.registry.list_open_applications()?)
    }

    /// Open kick proposals, ordered by id.
    pub fn kick_proposals(&self) -> Result<Vec<KickProposal>> {
        Ok(self.registry.list_open_kick_proposals()?)
    }

    /// An application in any status.
    pub fn application(&self, id: ProposalId) -> Result<Application> {
        self.registry
            .get_application(id)?
            .ok_or_else(|| QueryError::NotFound(format!("application {}", id)))
    }

    /// A kick proposal in any status.
    pub fn kick_proposal(&self, id: ProposalId) -> Result<KickProposal> {
        self.registry
            .get_kick_proposal(id)?
            .ok_or_else(|| QueryError::NotFound(format!("kick proposal {}", id)))
    }

    /// Answer a raw query: `path` is `custom/poa/<kind>` and `data` the JSON
    /// request body (empty for routes without parameters).
    pub fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let route = QueryRoute::parse(path)?;
        debug!(target: "poa", %route, "query");

        match route {
            QueryRoute::Validator => {
                let request: QueryValidatorParams = decode(data)?;
                encode(&self.validator(&request.address()?)?)
            }
            QueryRoute::Validators => encode(&self.validators()?),
            QueryRoute::Params => encode(&self.params()?),
            QueryRoute::Applications => encode(&self.applications()?),
            QueryRoute::KickProposals => encode(&self.kick_proposals()?),
            QueryRoute::Application => {
                let request: QueryProposalParams = decode(data)?;
                encode(&self.application(request.id)?)
            }
            QueryRoute::KickProposal => {
                let request: QueryProposalParams = decode(data)?;
                encode(&self.kick_proposal(request.id)?)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(QueryError::BadRequest)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(QueryError::Encode)
}
