//! Core primitives for PoA membership governance.
//!
//! This crate provides the data model shared by every other crate:
//! - Addresses, keys and signatures
//! - Validator records
//! - Applications, kick proposals and their ballots
//! - Governance parameters and genesis state
//! - Signed governance messages

pub mod crypto;
pub mod error;
pub mod genesis;
pub mod hash;
pub mod msg;
pub mod params;
pub mod proposal;
pub mod validator;

// Re-export commonly used types at the crate root
pub use crypto::{Address, CryptoError, Keypair, PublicKey, Signature};
pub use error::ErrorKind;
pub use genesis::{GenesisState, GenesisValidator};
pub use hash::{hash, Hash};
pub use msg::{Msg, MsgError, SignedMsg};
pub use params::{Fraction, Params, ParamsError};
pub use proposal::{
    Application, Ballot, KickProposal, Proposal, ProposalId, ProposalStatus, RejectionReason,
    Tally, Vote, VoteValue,
};
pub use validator::{Description, Validator, ValidatorStatus};
