//! Keeper errors.

use poa_core::{Address, ErrorKind, MsgError, ParamsError, ProposalId, ProposalStatus};
use poa_storage::StorageError;
use thiserror::Error;

/// Errors returned by keeper operations.
///
/// A failed operation never writes anything: every check runs before the
/// working set is committed.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("governance state is not initialized")]
    NotInitialized,

    #[error("governance state is already initialized")]
    AlreadyInitialized,

    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("invalid params: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("{0} is already an active validator")]
    AlreadyValidator(Address),

    #[error("candidate {candidate} already has open application {id}")]
    DuplicateApplication { candidate: Address, id: ProposalId },

    #[error("unknown application {0}")]
    UnknownApplication(ProposalId),

    #[error("{0} is not an active validator")]
    NotAValidator(Address),

    #[error("validator {target} already has open kick proposal {id}")]
    DuplicateProposal { target: Address, id: ProposalId },

    #[error("unknown kick proposal {0}")]
    UnknownKickProposal(ProposalId),

    #[error("proposal {id} is already {status}")]
    NotOpen { id: ProposalId, status: ProposalStatus },

    #[error("voting on proposal {id} closed at height {deadline}")]
    VotingClosed { id: ProposalId, deadline: u64 },

    #[error("{0} is not an active validator and cannot vote")]
    UnauthorizedVoter(Address),

    #[error("block height {got} does not follow last applied height {last}")]
    HeightNotIncreasing { last: u64, got: u64 },

    #[error("invalid message: {0}")]
    InvalidMsg(#[from] MsgError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl KeeperError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeeperError::UnknownApplication(_) | KeeperError::UnknownKickProposal(_) => {
                ErrorKind::NotFound
            }
            KeeperError::UnauthorizedVoter(_) | KeeperError::InvalidMsg(_) => {
                ErrorKind::Authorization
            }
            KeeperError::Storage(_) => ErrorKind::StoreFailure,
            KeeperError::NotInitialized
            | KeeperError::AlreadyInitialized
            | KeeperError::InvalidGenesis(_)
            | KeeperError::InvalidParams(_)
            | KeeperError::AlreadyValidator(_)
            | KeeperError::DuplicateApplication { .. }
            | KeeperError::NotAValidator(_)
            | KeeperError::DuplicateProposal { .. }
            | KeeperError::NotOpen { .. }
            | KeeperError::VotingClosed { .. }
            | KeeperError::HeightNotIncreasing { .. } => ErrorKind::Validation,
        }
    }
}

pub type Result<T> = std::result::Result<T, KeeperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let addr = Address([1; 20]);
        assert_eq!(
            KeeperError::UnauthorizedVoter(addr).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(KeeperError::UnknownApplication(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            KeeperError::DuplicateApplication {
                candidate: addr,
                id: 1
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            KeeperError::Storage(StorageError::NotFound("x".into())).kind(),
            ErrorKind::StoreFailure
        );
    }
}
