//! Governance parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a parameter set is not usable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("quorum denominator must be positive")]
    ZeroDenominator,

    #[error("quorum {numerator}/{denominator} must be in (0, 1]")]
    QuorumOutOfRange { numerator: u64, denominator: u64 },

    #[error("voting window must be at least one block")]
    ZeroVotingWindow,

    #[error("minimum active validator count must be at least one")]
    ZeroMinimumValidators,

    #[error("admission power must be positive")]
    ZeroAdmissionPower,
}

/// A threshold expressed as `numerator / denominator` of total active power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Check `part / total >= numerator / denominator` without rounding.
    pub fn is_met(&self, part: u64, total: u64) -> bool {
        (part as u128) * (self.denominator as u128) >= (self.numerator as u128) * (total as u128)
    }
}

/// PoA governance parameters, stored as a singleton and read by every
/// keeper operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Share of active voting power needed to approve a proposal.
    pub quorum: Fraction,
    /// Number of blocks a proposal stays open.
    pub voting_window: u64,
    /// A kick may never shrink the active set below this.
    pub min_active_validators: u32,
    /// Voting power given to a newly admitted validator.
    pub admission_power: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            quorum: Fraction::new(2, 3),
            voting_window: 100,
            min_active_validators: 1,
            admission_power: 10,
        }
    }
}

impl Params {
    /// Reject parameter sets the keeper cannot operate with.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let Fraction {
            numerator,
            denominator,
        } = self.quorum;
        if denominator == 0 {
            return Err(ParamsError::ZeroDenominator);
        }
        if numerator == 0 || numerator > denominator {
            return Err(ParamsError::QuorumOutOfRange {
                numerator,
                denominator,
            });
        }
        if self.voting_window == 0 {
            return Err(ParamsError::ZeroVotingWindow);
        }
        if self.min_active_validators == 0 {
            return Err(ParamsError::ZeroMinimumValidators);
        }
        if self.admission_power == 0 {
            return Err(ParamsError::ZeroAdmissionPower);
        }
        Ok(())
    }
}
