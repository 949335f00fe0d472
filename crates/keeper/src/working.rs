//! In-memory working set for a state transition or a whole block.
//!
//! A keeper operation loads the parameters, every validator and every open
//! proposal, mutates them here, and commits the touched records with one
//! registry batch. Nothing reaches the store until the operation succeeds.

use crate::error::{KeeperError, Result};
use crate::events::Event;
use poa_core::{
    Address, Application, KickProposal, Params, Proposal, ProposalId, Validator,
};
use poa_storage::{Registry, WriteSet};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone)]
pub(crate) struct WorkingSet {
    pub params: Params,
    pub validators: BTreeMap<Address, Validator>,
    /// Open applications plus any created or finalized during this operation.
    pub applications: BTreeMap<ProposalId, Application>,
    /// Open kick proposals plus any created or finalized during this operation.
    pub kick_proposals: BTreeMap<ProposalId, KickProposal>,
    next_application_id: ProposalId,
    next_kick_id: ProposalId,
    dirty_validators: BTreeSet<Address>,
    dirty_applications: BTreeSet<ProposalId>,
    dirty_kick_proposals: BTreeSet<ProposalId>,
    ids_advanced: (bool, bool),
    pub events: Vec<Event>,
}

impl WorkingSet {
    pub fn load(registry: &Registry<'_>) -> Result<Self> {
        let params = registry.get_params()?.ok_or(KeeperError::NotInitialized)?;
        let validators = registry
            .list_validators()?
            .into_iter()
            .map(|v| (v.address, v))
            .collect();
        let applications = registry
            .list_open_applications()?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let kick_proposals = registry
            .list_open_kick_proposals()?
            .into_iter()
            .map(|k| (k.id, k))
            .collect();

        Ok(Self {
            params,
            validators,
            applications,
            kick_proposals,
            next_application_id: registry.next_application_id()?,
            next_kick_id: registry.next_kick_id()?,
            dirty_validators: BTreeSet::new(),
            dirty_applications: BTreeSet::new(),
            dirty_kick_proposals: BTreeSet::new(),
            ids_advanced: (false, false),
            events: Vec::new(),
        })
    }

    // =========================================================================
    // Validator set
    // =========================================================================

    /// Power of `address` if it is an active validator.
    pub fn active_power(&self, address: &Address) -> Option<u64> {
        self.validators
            .get(address)
            .filter(|v| v.is_active())
            .map(|v| v.power)
    }

    pub fn total_active_power(&self) -> u64 {
        self.validators
            .values()
            .fold(0u64, |sum, v| sum.saturating_add(v.active_power()))
    }

    pub fn active_count(&self) -> usize {
        self.validators.values().filter(|v| v.is_active()).count()
    }

    pub fn put_validator(&mut self, validator: Validator) {
        self.dirty_validators.insert(validator.address);
        self.validators.insert(validator.address, validator);
    }

    pub fn validator_mut(&mut self, address: &Address) -> Option<&mut Validator> {
        let validator = self.validators.get_mut(address)?;
        self.dirty_validators.insert(*address);
        Some(validator)
    }

    // =========================================================================
    // Proposals
    // =========================================================================

    pub fn open_application_for(&self, candidate: &Address) -> Option<ProposalId> {
        self.applications
            .values()
            .find(|a| a.ballot.is_open() && a.candidate == *candidate)
            .map(|a| a.id)
    }

    pub fn open_kick_proposal_for(&self, target: &Address) -> Option<ProposalId> {
        self.kick_proposals
            .values()
            .find(|k| k.ballot.is_open() && k.target == *target)
            .map(|k| k.id)
    }

    pub fn open_application_ids(&self) -> Vec<ProposalId> {
        open_ids(&self.applications)
    }

    pub fn open_kick_ids(&self) -> Vec<ProposalId> {
        open_ids(&self.kick_proposals)
    }

    pub fn allocate_application_id(&mut self) -> ProposalId {
        let id = self.next_application_id;
        self.next_application_id += 1;
        self.ids_advanced.0 = true;
        id
    }

    pub fn allocate_kick_id(&mut self) -> ProposalId {
        let id = self.next_kick_id;
        self.next_kick_id += 1;
        self.ids_advanced.1 = true;
        id
    }

    /// Mutable access to an application, marking it for commit.
    pub fn application_mut(&mut self, id: ProposalId) -> Option<&mut Application> {
        let application = self.applications.get_mut(&id)?;
        self.dirty_applications.insert(id);
        Some(application)
    }

    /// Mutable access to a kick proposal, marking it for commit.
    pub fn kick_proposal_mut(&mut self, id: ProposalId) -> Option<&mut KickProposal> {
        let proposal = self.kick_proposals.get_mut(&id)?;
        self.dirty_kick_proposals.insert(id);
        Some(proposal)
    }

    pub fn insert_application(&mut self, application: Application) {
        self.dirty_applications.insert(application.id);
        self.applications.insert(application.id, application);
    }

    pub fn insert_kick_proposal(&mut self, proposal: KickProposal) {
        self.dirty_kick_proposals.insert(proposal.id);
        self.kick_proposals.insert(proposal.id, proposal);
    }

    /// Drop `voter`'s votes from every open proposal.
    pub fn retract_votes(&mut self, voter: &Address, power: u64) {
        for id in self.open_application_ids() {
            let retracted = self.applications[&id].ballot.vote_of(voter).is_some();
            if retracted {
                if let Some(application) = self.application_mut(id) {
                    application.ballot.retract(voter, power);
                }
                self.events.push(Event::VoteRetracted {
                    voter: *voter,
                    application: Some(id),
                    kick_proposal: None,
                });
            }
        }
        for id in self.open_kick_ids() {
            let retracted = self.kick_proposals[&id].ballot.vote_of(voter).is_some();
            if retracted {
                if let Some(proposal) = self.kick_proposal_mut(id) {
                    proposal.ballot.retract(voter, power);
                }
                self.events.push(Event::VoteRetracted {
                    voter: *voter,
                    application: None,
                    kick_proposal: Some(id),
                });
            }
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Collect every touched record.
    pub fn into_write_set(self) -> (WriteSet, Vec<Event>) {
        let WorkingSet {
            validators,
            applications,
            kick_proposals,
            next_application_id,
            next_kick_id,
            dirty_validators,
            dirty_applications,
            dirty_kick_proposals,
            ids_advanced,
            events,
            ..
        } = self;

        let writes = WriteSet {
            validators: collect_dirty(validators, &dirty_validators),
            applications: collect_dirty(applications, &dirty_applications),
            kick_proposals: collect_dirty(kick_proposals, &dirty_kick_proposals),
            params: None,
            next_application_id: ids_advanced.0.then_some(next_application_id),
            next_kick_id: ids_advanced.1.then_some(next_kick_id),
            last_height: None,
        };
        (writes, events)
    }
}

fn open_ids<P: Proposal>(proposals: &BTreeMap<ProposalId, P>) -> Vec<ProposalId> {
    proposals
        .values()
        .filter(|p| p.ballot().is_open())
        .map(|p| p.id())
        .collect()
}

fn collect_dirty<K: Ord, V>(mut records: BTreeMap<K, V>, dirty: &BTreeSet<K>) -> Vec<V> {
    dirty.iter().filter_map(|key| records.remove(key)).collect()
}
