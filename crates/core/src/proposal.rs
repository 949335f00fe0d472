//! Applications, kick proposals and the ballot they share.
//!
//! Both proposal kinds carry a [`Ballot`]: the proposer, the ordered vote set
//! and a running tally that is updated in place on every vote instead of
//! being recomputed from the full vote list.

use crate::crypto::Address;
use crate::error::ErrorKind;
use crate::validator::Description;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an application or kick proposal (separate sequences).
pub type ProposalId = u64;

/// A voter's choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteValue {
    Approve,
    Reject,
}

impl From<bool> for VoteValue {
    fn from(approve: bool) -> Self {
        if approve {
            VoteValue::Approve
        } else {
            VoteValue::Reject
        }
    }
}

/// A single recorded vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Address,
    pub value: VoteValue,
}

/// Running sums of the voting power behind each choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub approve_power: u64,
    pub reject_power: u64,
}

impl Tally {
    fn add(&mut self, value: VoteValue, power: u64) {
        match value {
            VoteValue::Approve => self.approve_power = self.approve_power.saturating_add(power),
            VoteValue::Reject => self.reject_power = self.reject_power.saturating_add(power),
        }
    }

    fn sub(&mut self, value: VoteValue, power: u64) {
        match value {
            VoteValue::Approve => self.approve_power = self.approve_power.saturating_sub(power),
            VoteValue::Reject => self.reject_power = self.reject_power.saturating_sub(power),
        }
    }
}

/// Lifecycle of a proposal. Everything but `Open` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Open,
    Approved,
    Rejected,
    Expired,
}

impl ProposalStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, ProposalStatus::Open)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Why a proposal ended up `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Approve plus undecided power can no longer reach quorum.
    QuorumUnreachable,
    /// Quorum was reached but removing the target would drop the active set
    /// below the configured minimum.
    QuorumMetButFloorViolation,
}

impl RejectionReason {
    /// Error category callers should report, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RejectionReason::QuorumUnreachable => None,
            RejectionReason::QuorumMetButFloorViolation => Some(ErrorKind::PolicyViolation),
        }
    }
}

/// Vote-bearing state shared by applications and kick proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Validator that opened the proposal.
    pub proposer: Address,
    /// Votes ordered by voter address, at most one per voter.
    pub votes: Vec<Vote>,
    /// Running tally over `votes`.
    pub tally: Tally,
    /// Height the proposal was opened at.
    pub created_at: u64,
    pub status: ProposalStatus,
    /// Height the proposal was finalized at.
    pub finalized_at: Option<u64>,
    /// Set only when `status` is `Rejected`.
    pub rejection: Option<RejectionReason>,
}

impl Ballot {
    /// Open an empty ballot.
    pub fn open(proposer: Address, height: u64) -> Self {
        Self {
            proposer,
            votes: Vec::new(),
            tally: Tally::default(),
            created_at: height,
            status: ProposalStatus::Open,
            finalized_at: None,
            rejection: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ProposalStatus::Open
    }

    /// First height at which the proposal no longer accepts votes.
    pub fn deadline(&self, voting_window: u64) -> u64 {
        self.created_at.saturating_add(voting_window)
    }

    /// The vote recorded for `voter`, if any.
    pub fn vote_of(&self, voter: &Address) -> Option<VoteValue> {
        self.votes
            .binary_search_by(|v| v.voter.cmp(voter))
            .ok()
            .map(|i| self.votes[i].value)
    }

    /// Record `voter`'s vote, replacing any earlier one, and return the
    /// replaced value.
    ///
    /// `power` is the voter's active power; since an active validator's power
    /// does not change, it is also the weight of the replaced vote.
    pub fn cast(&mut self, voter: Address, value: VoteValue, power: u64) -> Option<VoteValue> {
        let previous = match self.votes.binary_search_by(|v| v.voter.cmp(&voter)) {
            Ok(i) => {
                let previous = self.votes[i].value;
                self.tally.sub(previous, power);
                self.votes[i].value = value;
                Some(previous)
            }
            Err(i) => {
                self.votes.insert(i, Vote { voter, value });
                None
            }
        };
        self.tally.add(value, power);
        previous
    }

    /// Drop `voter`'s vote and its weight from the tally.
    pub fn retract(&mut self, voter: &Address, power: u64) -> bool {
        match self.votes.binary_search_by(|v| v.voter.cmp(voter)) {
            Ok(i) => {
                let removed = self.votes.remove(i);
                self.tally.sub(removed.value, power);
                true
            }
            Err(_) => false,
        }
    }

    /// Move to a final status. Returns `false` (and changes nothing) if the
    /// ballot was already finalized.
    pub fn finalize(
        &mut self,
        status: ProposalStatus,
        height: u64,
        rejection: Option<RejectionReason>,
    ) -> bool {
        if !self.is_open() || !status.is_final() {
            return false;
        }
        self.status = status;
        self.finalized_at = Some(height);
        self.rejection = rejection;
        true
    }
}

/// Common access to the two proposal kinds.
pub trait Proposal {
    fn id(&self) -> ProposalId;
    /// The candidate (applications) or target (kick proposals).
    fn subject(&self) -> Address;
    fn ballot(&self) -> &Ballot;
    fn ballot_mut(&mut self) -> &mut Ballot;
}

/// A request to admit `candidate` into the validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ProposalId,
    pub candidate: Address,
    /// Metadata the candidate takes on when admitted.
    pub description: Description,
    pub ballot: Ballot,
}

impl Proposal for Application {
    fn id(&self) -> ProposalId {
        self.id
    }

    fn subject(&self) -> Address {
        self.candidate
    }

    fn ballot(&self) -> &Ballot {
        &self.ballot
    }

    fn ballot_mut(&mut self) -> &mut Ballot {
        &mut self.ballot
    }
}

/// A request to remove `target` from the validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickProposal {
    pub id: ProposalId,
    pub target: Address,
    pub ballot: Ballot,
}

impl Proposal for KickProposal {
    fn id(&self) -> ProposalId {
        self.id
    }

    fn subject(&self) -> Address {
        self.target
    }

    fn ballot(&self) -> &Ballot {
        &self.ballot
    }

    fn ballot_mut(&mut self) -> &mut Ballot {
        &mut self.ballot
    }
}
