//! Governance messages and their signed envelope.

use crate::crypto::{Address, Keypair, PublicKey, Signature};
use crate::hash::{hash, Hash};
use crate::proposal::ProposalId;
use crate::validator::Description;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when checking a signed message.
#[derive(Debug, Error)]
pub enum MsgError {
    #[error("public key does not belong to sender {0}")]
    SenderMismatch(Address),
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A state-changing governance action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Msg {
    /// Propose `candidate` for admission; carries the sender's approve vote.
    SubmitApplication {
        candidate: Address,
        description: Description,
    },
    /// Vote on an open application.
    VoteApplication { id: ProposalId, approve: bool },
    /// Propose removing `target`; carries the sender's approve vote.
    SubmitKickProposal { target: Address },
    /// Vote on an open kick proposal.
    VoteKickProposal { id: ProposalId, approve: bool },
}

impl Msg {
    /// Short name used in logs and receipts.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::SubmitApplication { .. } => "submit-application",
            Msg::VoteApplication { .. } => "vote-application",
            Msg::SubmitKickProposal { .. } => "submit-kick-proposal",
            Msg::VoteKickProposal { .. } => "vote-kick-proposal",
        }
    }
}

/// A message signed by its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMsg {
    /// Sender's address (must match `public_key`).
    pub sender: Address,
    /// Sender's public key.
    pub public_key: PublicKey,
    pub msg: Msg,
    pub signature: Signature,
}

/// The part of a [`SignedMsg`] that is signed.
#[derive(Serialize)]
struct SigningPayload<'a> {
    sender: &'a Address,
    msg: &'a Msg,
}

impl SignedMsg {
    /// Sign `msg` with `keypair`.
    pub fn new(msg: Msg, keypair: &Keypair) -> Self {
        let sender = keypair.address();
        let signature = keypair.sign_hash(&Self::payload_hash(&sender, &msg));
        Self {
            sender,
            public_key: keypair.public_key.clone(),
            msg,
            signature,
        }
    }

    fn payload_hash(sender: &Address, msg: &Msg) -> Hash {
        let encoded = bincode::serialize(&SigningPayload { sender, msg })
            .expect("serialization should not fail");
        hash(&encoded)
    }

    /// Hash of the unsigned payload.
    pub fn signing_hash(&self) -> Hash {
        Self::payload_hash(&self.sender, &self.msg)
    }

    /// Hash of the whole envelope, used to identify the transaction.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Check that the key belongs to the sender and the signature is valid.
    pub fn verify(&self) -> Result<(), MsgError> {
        if self.public_key.to_address() != self.sender {
            return Err(MsgError::SenderMismatch(self.sender));
        }
        self.public_key
            .verify(self.signing_hash().as_bytes(), &self.signature)
            .map_err(|_| MsgError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_msg_verifies() {
        let keypair = Keypair::generate();
        let signed = SignedMsg::new(
            Msg::SubmitKickProposal {
                target: Address([7; 20]),
            },
            &keypair,
        );
        assert_eq!(signed.sender, keypair.address());
        assert!(signed.verify().is_ok());
    }

    #[test]
    fn test_tampered_msg_fails() {
        let keypair = Keypair::generate();
        let mut signed = SignedMsg::new(Msg::VoteApplication { id: 1, approve: true }, &keypair);
        signed.msg = Msg::VoteApplication { id: 1, approve: false };
        assert!(matches!(signed.verify(), Err(MsgError::VerificationFailed)));
    }

    #[test]
    fn test_foreign_key_fails() {
        let keypair = Keypair::generate();
        let other = Keypair::generate();
        let mut signed = SignedMsg::new(Msg::VoteKickProposal { id: 3, approve: true }, &keypair);
        signed.public_key = other.public_key.clone();
        assert!(matches!(signed.verify(), Err(MsgError::SenderMismatch(_))));
    }

    #[test]
    fn test_bincode_roundtrip() {
        let keypair = Keypair::generate();
        let signed = SignedMsg::new(
            Msg::SubmitApplication {
                candidate: Address([9; 20]),
                description: Description::new("carol"),
            },
            &keypair,
        );
        let bytes = bincode::serialize(&signed).unwrap();
        let decoded: SignedMsg = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, signed);
        assert!(decoded.verify().is_ok());
    }
}
