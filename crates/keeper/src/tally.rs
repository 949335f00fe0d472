//! Threshold evaluation of a ballot.
//!
//! The ballot keeps a running tally, so evaluation is constant time: it only
//! compares the approve and reject sums with the current active power.

use poa_core::{Ballot, Params};

/// What a ballot's tally means at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Approve power reached the quorum.
    QuorumMet,
    /// Approve plus undecided power can no longer reach the quorum.
    Unreachable,
    /// The voting window elapsed without a decision.
    Expired,
    /// Still undecided.
    Pending,
}

/// Evaluate `ballot` against `total_power` of active validators at `height`.
///
/// Precedence: quorum, then unreachability, then expiry.
pub fn evaluate(ballot: &Ballot, total_power: u64, params: &Params, height: u64) -> Verdict {
    let quorum = params.quorum;
    let tally = ballot.tally;

    if total_power > 0 && quorum.is_met(tally.approve_power, total_power) {
        return Verdict::QuorumMet;
    }

    let reachable = total_power.saturating_sub(tally.reject_power);
    if !quorum.is_met(reachable, total_power) {
        return Verdict::Unreachable;
    }

    if height >= ballot.deadline(params.voting_window) {
        return Verdict::Expired;
    }

    Verdict::Pending
}
