//! Removal: kick proposals against active validators.

use crate::error::{KeeperError, Result};
use crate::events::{Event, Outcome};
use crate::keeper::{Context, Keeper};
use crate::working::WorkingSet;
use poa_core::{Address, Ballot, KickProposal, Msg, ProposalId, VoteValue};
use tracing::{debug, info};

impl<'a> Keeper<'a> {
    /// Open a kick proposal against `target`, proposed by an active validator.
    ///
    /// A validator may propose its own removal.
    pub fn submit_kick_proposal(
        &mut self,
        ctx: Context,
        proposer: Address,
        target: Address,
    ) -> Result<Outcome> {
        self.apply(ctx, proposer, &Msg::SubmitKickProposal { target })
    }

    /// Record `voter`'s vote on kick proposal `id`, replacing any earlier vote.
    pub fn vote_kick_proposal(
        &mut self,
        ctx: Context,
        id: ProposalId,
        voter: Address,
        value: VoteValue,
    ) -> Result<Outcome> {
        let msg = Msg::VoteKickProposal {
            id,
            approve: value == VoteValue::Approve,
        };
        self.apply(ctx, voter, &msg)
    }

    pub(crate) fn open_kick_proposal(
        &self,
        ws: &mut WorkingSet,
        ctx: Context,
        proposer: Address,
        target: Address,
    ) -> Result<ProposalId> {
        if ws.active_power(&target).is_none() {
            return Err(KeeperError::NotAValidator(target));
        }
        if let Some(id) = ws.open_kick_proposal_for(&target) {
            return Err(KeeperError::DuplicateProposal { target, id });
        }
        let power = ws
            .active_power(&proposer)
            .ok_or(KeeperError::UnauthorizedVoter(proposer))?;

        let id = ws.allocate_kick_id();
        let mut ballot = Ballot::open(proposer, ctx.height);
        ballot.cast(proposer, VoteValue::Approve, power);
        ws.insert_kick_proposal(KickProposal { id, target, ballot });
        ws.events.push(Event::KickProposalSubmitted {
            id,
            target,
            proposer,
        });
        info!(
            target: "poa",
            id,
            validator = %target,
            proposer = %proposer,
            height = ctx.height,
            "kick proposal submitted"
        );
        Ok(id)
    }

    pub(crate) fn cast_kick_vote(
        &self,
        ws: &mut WorkingSet,
        ctx: Context,
        id: ProposalId,
        voter: Address,
        value: VoteValue,
    ) -> Result<()> {
        let deadline = match ws.kick_proposals.get(&id) {
            Some(proposal) if proposal.ballot.is_open() => {
                proposal.ballot.deadline(ws.params.voting_window)
            }
            Some(proposal) => {
                return Err(KeeperError::NotOpen {
                    id,
                    status: proposal.ballot.status,
                })
            }
            None => {
                return Err(match self.registry.get_kick_proposal(id)? {
                    Some(proposal) => KeeperError::NotOpen {
                        id,
                        status: proposal.ballot.status,
                    },
                    None => KeeperError::UnknownKickProposal(id),
                })
            }
        };
        if ctx.height >= deadline {
            return Err(KeeperError::VotingClosed { id, deadline });
        }
        let power = ws
            .active_power(&voter)
            .ok_or(KeeperError::UnauthorizedVoter(voter))?;

        if let Some(proposal) = ws.kick_proposal_mut(id) {
            proposal.ballot.cast(voter, value, power);
        }
        ws.events.push(Event::KickProposalVoted { id, voter, value });
        debug!(target: "poa", id, voter = %voter, ?value, "kick vote recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poa_core::{GenesisState, ProposalStatus, RejectionReason, ValidatorStatus};
    use poa_storage::Storage;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    fn setup(validators: &[u8], min_active: u32) -> Storage {
        let storage = Storage::open_temporary().unwrap();
        let mut genesis = GenesisState::with_validators(validators.iter().map(|b| addr(*b)), 10);
        genesis.params.min_active_validators = min_active;
        Keeper::new(&storage).init_genesis(&genesis).unwrap();
        storage
    }

    #[test]
    fn test_kick_removes_validator() {
        let storage = setup(&[1, 2, 3], 1);
        let mut keeper = Keeper::new(&storage);

        let id = keeper
            .submit_kick_proposal(Context::at(1), addr(1), addr(3))
            .unwrap()
            .id;
        let outcome = keeper
            .vote_kick_proposal(Context::at(2), id, addr(2), VoteValue::Approve)
            .unwrap();
        assert_eq!(outcome.status, ProposalStatus::Approved);
        assert!(outcome
            .events
            .contains(&Event::ValidatorRemoved { address: addr(3) }));

        let removed = keeper.registry().get_validator(&addr(3)).unwrap().unwrap();
        assert_eq!(removed.status, ValidatorStatus::Removed);
        assert_eq!(removed.removed_at, Some(2));
    }

    #[test]
    fn test_floor_violation_keeps_validator() {
        let storage = setup(&[1, 2, 3], 3);
        let mut keeper = Keeper::new(&storage);

        let id = keeper
            .submit_kick_proposal(Context::at(1), addr(1), addr(3))
            .unwrap()
            .id;
        let outcome = keeper
            .vote_kick_proposal(Context::at(2), id, addr(2), VoteValue::Approve)
            .unwrap();
        assert_eq!(outcome.status, ProposalStatus::Rejected);
        assert_eq!(
            outcome.rejection,
            Some(RejectionReason::QuorumMetButFloorViolation)
        );

        let active = keeper
            .registry()
            .list_validators()
            .unwrap()
            .into_iter()
            .filter(|v| v.is_active())
            .count();
        assert_eq!(active, 3);
    }

    #[test]
    fn test_submit_rejections() {
        let storage = setup(&[1, 2, 3], 1);
        let mut keeper = Keeper::new(&storage);
        let ctx = Context::at(1);

        assert!(matches!(
            keeper.submit_kick_proposal(ctx, addr(1), addr(9)),
            Err(KeeperError::NotAValidator(a)) if a == addr(9)
        ));
        assert!(matches!(
            keeper.submit_kick_proposal(ctx, addr(9), addr(2)),
            Err(KeeperError::UnauthorizedVoter(a)) if a == addr(9)
        ));

        let first = keeper.submit_kick_proposal(ctx, addr(1), addr(2)).unwrap();
        assert!(matches!(
            keeper.submit_kick_proposal(ctx, addr(3), addr(2)),
            Err(KeeperError::DuplicateProposal { id, .. }) if id == first.id
        ));
    }

    #[test]
    fn test_self_kick_is_allowed() {
        let storage = setup(&[1, 2, 3], 1);
        let mut keeper = Keeper::new(&storage);

        let outcome = keeper
            .submit_kick_proposal(Context::at(1), addr(2), addr(2))
            .unwrap();
        assert_eq!(outcome.status, ProposalStatus::Open);
        assert_eq!(outcome.id, 1);
    }

    #[test]
    fn test_unknown_kick_proposal() {
        let storage = setup(&[1, 2], 1);
        let mut keeper = Keeper::new(&storage);

        let err = keeper
            .vote_kick_proposal(Context::at(1), 5, addr(1), VoteValue::Reject)
            .unwrap_err();
        assert!(matches!(err, KeeperError::UnknownKickProposal(5)));
    }
}
