//! The keeper: sole mutator of PoA governance state.

use crate::error::{KeeperError, Result};
use crate::events::{Event, Outcome};
use crate::tally::{self, Verdict};
use crate::working::WorkingSet;
use poa_core::{
    Address, GenesisState, Msg, Params, Proposal, ProposalId, ProposalStatus, RejectionReason,
    Validator, VoteValue,
};
use poa_storage::{Registry, Storage, WriteSet};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Block context every state transition runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Height of the block being processed.
    pub height: u64,
}

impl Context {
    /// Context for the block at `height`.
    pub fn at(height: u64) -> Self {
        Self { height }
    }
}

/// Owns all writes to the governance registry.
///
/// Mutating methods take `&mut self`: transactions are applied one at a time
/// and each operation either commits all of its changes or none.
pub struct Keeper<'a> {
    pub(crate) registry: Registry<'a>,
}

impl<'a> Keeper<'a> {
    /// Create a keeper writing to `storage`.
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            registry: Registry::new(storage),
        }
    }

    /// Read access to the underlying registry.
    pub fn registry(&self) -> &Registry<'a> {
        &self.registry
    }

    /// Current parameters.
    pub fn params(&self) -> Result<Params> {
        self.registry.get_params()?.ok_or(KeeperError::NotInitialized)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Write the genesis parameters and validator set.
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> Result<Vec<Event>> {
        if self.registry.get_params()?.is_some() {
            return Err(KeeperError::AlreadyInitialized);
        }
        genesis.params.validate()?;

        if genesis.validators.len() < genesis.params.min_active_validators as usize {
            return Err(KeeperError::InvalidGenesis(format!(
                "{} validators configured, minimum is {}",
                genesis.validators.len(),
                genesis.params.min_active_validators
            )));
        }

        let mut seen = BTreeSet::new();
        let mut events = Vec::new();
        let mut validators = Vec::with_capacity(genesis.validators.len());
        for entry in &genesis.validators {
            if !seen.insert(entry.address) {
                return Err(KeeperError::InvalidGenesis(format!(
                    "duplicate validator {}",
                    entry.address
                )));
            }
            if entry.power == 0 {
                return Err(KeeperError::InvalidGenesis(format!(
                    "validator {} has zero power",
                    entry.address
                )));
            }
            validators.push(Validator::new(
                entry.address,
                entry.power,
                entry.description.clone(),
                0,
            ));
            events.push(Event::ValidatorAdmitted {
                address: entry.address,
                power: entry.power,
            });
        }
        events.push(Event::ParamsUpdated);

        self.registry.commit(&WriteSet {
            validators,
            params: Some(genesis.params.clone()),
            ..WriteSet::default()
        })?;

        info!(
            target: "poa",
            validators = genesis.validators.len(),
            "genesis initialized"
        );
        Ok(events)
    }

    /// Replace the parameters and re-evaluate open proposals under them.
    pub fn set_params(&mut self, ctx: Context, params: Params) -> Result<Vec<Event>> {
        params.validate()?;
        self.ensure_open_height(ctx.height)?;
        let mut ws = self.load()?;
        ws.params = params.clone();
        ws.events.push(Event::ParamsUpdated);
        settle(&mut ws, ctx.height);

        let (mut writes, events) = ws.into_write_set();
        writes.params = Some(params);
        self.registry.commit(&writes)?;

        info!(target: "poa", height = ctx.height, "params updated");
        Ok(events)
    }

    /// Expire proposals whose voting window has elapsed and close the block.
    ///
    /// The sweep and the height are written together; later work at this
    /// height or below is refused.
    pub fn end_block(&mut self, ctx: Context) -> Result<Vec<Event>> {
        self.ensure_open_height(ctx.height)?;
        let mut ws = self.load()?;
        settle(&mut ws, ctx.height);

        let (mut writes, events) = ws.into_write_set();
        writes.last_height = Some(ctx.height);
        self.registry.commit(&writes)?;
        Ok(events)
    }

    // =========================================================================
    // Message execution
    // =========================================================================

    pub(crate) fn load(&self) -> Result<WorkingSet> {
        WorkingSet::load(&self.registry)
    }

    pub(crate) fn commit(&self, ws: WorkingSet) -> Result<Vec<Event>> {
        let (writes, events) = ws.into_write_set();
        self.registry.commit(&writes)?;
        Ok(events)
    }

    /// Fail if the block at `height` has already been closed.
    pub(crate) fn ensure_open_height(&self, height: u64) -> Result<()> {
        match self.registry.last_height()? {
            Some(last) if height <= last => {
                Err(KeeperError::HeightNotIncreasing { last, got: height })
            }
            _ => Ok(()),
        }
    }

    /// Run `msg` from `sender` against `ws` and settle the result.
    ///
    /// Nothing is committed here. On error `ws` may hold partial changes and
    /// must be discarded by the caller.
    pub(crate) fn execute(
        &self,
        ws: &mut WorkingSet,
        ctx: Context,
        sender: Address,
        msg: &Msg,
    ) -> Result<Outcome> {
        let since = ws.events.len();
        let id = match msg {
            Msg::SubmitApplication {
                candidate,
                description,
            } => self.open_application(ws, ctx, sender, *candidate, description.clone())?,
            Msg::VoteApplication { id, approve } => {
                self.cast_application_vote(ws, ctx, *id, sender, VoteValue::from(*approve))?;
                *id
            }
            Msg::SubmitKickProposal { target } => {
                self.open_kick_proposal(ws, ctx, sender, *target)?
            }
            Msg::VoteKickProposal { id, approve } => {
                self.cast_kick_vote(ws, ctx, *id, sender, VoteValue::from(*approve))?;
                *id
            }
        };

        settle(ws, ctx.height);

        let ballot = match msg {
            Msg::SubmitApplication { .. } | Msg::VoteApplication { .. } => ws
                .applications
                .get(&id)
                .map(|a| &a.ballot)
                .ok_or(KeeperError::UnknownApplication(id))?,
            Msg::SubmitKickProposal { .. } | Msg::VoteKickProposal { .. } => ws
                .kick_proposals
                .get(&id)
                .map(|k| &k.ballot)
                .ok_or(KeeperError::UnknownKickProposal(id))?,
        };
        Ok(Outcome {
            id,
            status: ballot.status,
            rejection: ballot.rejection,
            events: ws.events[since..].to_vec(),
        })
    }

    /// Execute a single message in its own working set and commit it.
    pub(crate) fn apply(&self, ctx: Context, sender: Address, msg: &Msg) -> Result<Outcome> {
        self.ensure_open_height(ctx.height)?;
        let mut ws = self.load()?;
        let outcome = self.execute(&mut ws, ctx, sender, msg)?;
        self.commit(ws)?;
        Ok(outcome)
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Evaluate every open proposal until a full pass finalizes nothing.
///
/// Proposals are visited in id order, applications first. A finalization can
/// change the active set, which is why passes repeat.
pub(crate) fn settle(ws: &mut WorkingSet, height: u64) {
    loop {
        let mut finalized = false;
        for id in ws.open_application_ids() {
            finalized |= settle_application(ws, id, height);
        }
        for id in ws.open_kick_ids() {
            finalized |= settle_kick_proposal(ws, id, height);
        }
        if !finalized {
            break;
        }
    }
}

fn settle_application(ws: &mut WorkingSet, id: ProposalId, height: u64) -> bool {
    let total = ws.total_active_power();
    let verdict = match ws.applications.get(&id) {
        Some(application) => tally::evaluate(&application.ballot, total, &ws.params, height),
        None => return false,
    };

    match verdict {
        Verdict::Pending => false,
        Verdict::QuorumMet => {
            admit_candidate(ws, id, height);
            finalize_application(ws, id, ProposalStatus::Approved, None, height)
        }
        Verdict::Unreachable => finalize_application(
            ws,
            id,
            ProposalStatus::Rejected,
            Some(RejectionReason::QuorumUnreachable),
            height,
        ),
        Verdict::Expired => finalize_application(ws, id, ProposalStatus::Expired, None, height),
    }
}

fn settle_kick_proposal(ws: &mut WorkingSet, id: ProposalId, height: u64) -> bool {
    let total = ws.total_active_power();
    let verdict = match ws.kick_proposals.get(&id) {
        Some(proposal) => tally::evaluate(&proposal.ballot, total, &ws.params, height),
        None => return false,
    };

    match verdict {
        Verdict::Pending => false,
        Verdict::QuorumMet => {
            let remaining = ws.active_count().saturating_sub(1);
            let floor = ws.params.min_active_validators as usize;
            if remaining < floor {
                warn!(
                    target: "poa",
                    id,
                    remaining,
                    floor,
                    "kick proposal reached quorum but would breach the validator floor"
                );
                return finalize_kick_proposal(
                    ws,
                    id,
                    ProposalStatus::Rejected,
                    Some(RejectionReason::QuorumMetButFloorViolation),
                    height,
                );
            }
            let finalized = finalize_kick_proposal(ws, id, ProposalStatus::Approved, None, height);
            remove_target(ws, id, height);
            finalized
        }
        Verdict::Unreachable => finalize_kick_proposal(
            ws,
            id,
            ProposalStatus::Rejected,
            Some(RejectionReason::QuorumUnreachable),
            height,
        ),
        Verdict::Expired => finalize_kick_proposal(ws, id, ProposalStatus::Expired, None, height),
    }
}

fn finalize_application(
    ws: &mut WorkingSet,
    id: ProposalId,
    status: ProposalStatus,
    rejection: Option<RejectionReason>,
    height: u64,
) -> bool {
    let Some(application) = ws.application_mut(id) else {
        return false;
    };
    if !application.ballot.finalize(status, height, rejection) {
        return false;
    }
    let candidate = application.candidate;
    info!(target: "poa", id, candidate = %candidate, %status, "application finalized");
    ws.events.push(Event::ApplicationFinalized {
        id,
        candidate,
        status,
        rejection,
    });
    true
}

fn finalize_kick_proposal(
    ws: &mut WorkingSet,
    id: ProposalId,
    status: ProposalStatus,
    rejection: Option<RejectionReason>,
    height: u64,
) -> bool {
    let Some(proposal) = ws.kick_proposal_mut(id) else {
        return false;
    };
    if !proposal.ballot.finalize(status, height, rejection) {
        return false;
    }
    let target = proposal.target;
    info!(target: "poa", id, validator = %target, %status, "kick proposal finalized");
    ws.events.push(Event::KickProposalFinalized {
        id,
        target,
        status,
        rejection,
    });
    true
}

fn admit_candidate(ws: &mut WorkingSet, id: ProposalId, height: u64) {
    let Some(application) = ws.applications.get(&id) else {
        return;
    };
    let candidate = application.subject();
    let description = application.description.clone();
    let power = ws.params.admission_power;

    match ws.validator_mut(&candidate) {
        Some(validator) => validator.readmit(power, description, height),
        None => ws.put_validator(Validator::new(candidate, power, description, height)),
    }
    info!(target: "poa", validator = %candidate, power, "validator admitted");
    ws.events.push(Event::ValidatorAdmitted {
        address: candidate,
        power,
    });
}

fn remove_target(ws: &mut WorkingSet, id: ProposalId, height: u64) {
    let Some(target) = ws.kick_proposals.get(&id).map(|k| k.subject()) else {
        return;
    };
    let Some(power) = ws.active_power(&target) else {
        return;
    };
    if let Some(validator) = ws.validator_mut(&target) {
        validator.remove(height);
    }
    info!(target: "poa", validator = %target, "validator removed");
    ws.events.push(Event::ValidatorRemoved { address: target });

    ws.retract_votes(&target, power);
    debug!(target: "poa", validator = %target, "votes of removed validator retracted");
}
