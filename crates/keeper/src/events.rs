//! Events emitted by state transitions.

use poa_core::{Address, ProposalId, ProposalStatus, RejectionReason, VoteValue};
use serde::{Deserialize, Serialize};

/// Something observable that a keeper operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ApplicationSubmitted {
        id: ProposalId,
        candidate: Address,
        proposer: Address,
    },
    ApplicationVoted {
        id: ProposalId,
        voter: Address,
        value: VoteValue,
    },
    ApplicationFinalized {
        id: ProposalId,
        candidate: Address,
        status: ProposalStatus,
        rejection: Option<RejectionReason>,
    },
    KickProposalSubmitted {
        id: ProposalId,
        target: Address,
        proposer: Address,
    },
    KickProposalVoted {
        id: ProposalId,
        voter: Address,
        value: VoteValue,
    },
    KickProposalFinalized {
        id: ProposalId,
        target: Address,
        status: ProposalStatus,
        rejection: Option<RejectionReason>,
    },
    ValidatorAdmitted {
        address: Address,
        power: u64,
    },
    ValidatorRemoved {
        address: Address,
    },
    /// A removed validator's vote was dropped from an open proposal.
    VoteRetracted {
        voter: Address,
        application: Option<ProposalId>,
        kick_proposal: Option<ProposalId>,
    },
    ParamsUpdated,
}

/// Result of a submit or vote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// The proposal the operation acted on.
    pub id: ProposalId,
    /// Its status after the operation (and any cascading evaluation).
    pub status: ProposalStatus,
    pub rejection: Option<RejectionReason>,
    /// Everything the operation changed, in order.
    pub events: Vec<Event>,
}
