//! Admission: applications to join the validator set.

use crate::error::{KeeperError, Result};
use crate::events::{Event, Outcome};
use crate::keeper::{Context, Keeper};
use crate::working::WorkingSet;
use poa_core::{Address, Application, Ballot, Description, Msg, ProposalId, VoteValue};
use tracing::{debug, info};

impl<'a> Keeper<'a> {
    /// Open an application for `candidate`, proposed by an active validator.
    ///
    /// The proposer's approve vote is recorded immediately, so a single
    /// validator holding quorum admits the candidate in the same call.
    pub fn submit_application(
        &mut self,
        ctx: Context,
        proposer: Address,
        candidate: Address,
        description: Description,
    ) -> Result<Outcome> {
        let msg = Msg::SubmitApplication {
            candidate,
            description,
        };
        self.apply(ctx, proposer, &msg)
    }

    /// Record `voter`'s vote on application `id`, replacing any earlier vote.
    pub fn vote_application(
        &mut self,
        ctx: Context,
        id: ProposalId,
        voter: Address,
        value: VoteValue,
    ) -> Result<Outcome> {
        let msg = Msg::VoteApplication {
            id,
            approve: value == VoteValue::Approve,
        };
        self.apply(ctx, voter, &msg)
    }

    pub(crate) fn open_application(
        &self,
        ws: &mut WorkingSet,
        ctx: Context,
        proposer: Address,
        candidate: Address,
        description: Description,
    ) -> Result<ProposalId> {
        if ws.active_power(&candidate).is_some() {
            return Err(KeeperError::AlreadyValidator(candidate));
        }
        if let Some(id) = ws.open_application_for(&candidate) {
            return Err(KeeperError::DuplicateApplication { candidate, id });
        }
        let power = ws
            .active_power(&proposer)
            .ok_or(KeeperError::UnauthorizedVoter(proposer))?;

        let id = ws.allocate_application_id();
        let mut ballot = Ballot::open(proposer, ctx.height);
        ballot.cast(proposer, VoteValue::Approve, power);
        ws.insert_application(Application {
            id,
            candidate,
            description,
            ballot,
        });
        ws.events.push(Event::ApplicationSubmitted {
            id,
            candidate,
            proposer,
        });
        info!(
            target: "poa",
            id,
            candidate = %candidate,
            proposer = %proposer,
            height = ctx.height,
            "application submitted"
        );
        Ok(id)
    }

    pub(crate) fn cast_application_vote(
        &self,
        ws: &mut WorkingSet,
        ctx: Context,
        id: ProposalId,
        voter: Address,
        value: VoteValue,
    ) -> Result<()> {
        // Finalized records stay in the working set until the block commits.
        let deadline = match ws.applications.get(&id) {
            Some(application) if application.ballot.is_open() => {
                application.ballot.deadline(ws.params.voting_window)
            }
            Some(application) => {
                return Err(KeeperError::NotOpen {
                    id,
                    status: application.ballot.status,
                })
            }
            None => {
                return Err(match self.registry.get_application(id)? {
                    Some(application) => KeeperError::NotOpen {
                        id,
                        status: application.ballot.status,
                    },
                    None => KeeperError::UnknownApplication(id),
                })
            }
        };
        if ctx.height >= deadline {
            return Err(KeeperError::VotingClosed { id, deadline });
        }
        let power = ws
            .active_power(&voter)
            .ok_or(KeeperError::UnauthorizedVoter(voter))?;

        if let Some(application) = ws.application_mut(id) {
            application.ballot.cast(voter, value, power);
        }
        ws.events.push(Event::ApplicationVoted { id, voter, value });
        debug!(target: "poa", id, voter = %voter, ?value, "application vote recorded");
        Ok(())
    }
}
