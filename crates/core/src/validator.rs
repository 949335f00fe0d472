//! Validator records.

use crate::crypto::Address;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a validator.
///
/// Removed validators are tombstones: the record stays in the registry so
/// historical queries keep working, but it no longer counts toward quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorStatus {
    Active,
    Removed,
}

/// Human-readable validator metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Display name.
    pub moniker: String,
}

impl Description {
    pub fn new(moniker: impl Into<String>) -> Self {
        Self {
            moniker: moniker.into(),
        }
    }
}

/// A member (current or former) of the validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Validator identity.
    pub address: Address,
    /// Weight of this validator's votes.
    pub power: u64,
    /// Active or tombstoned.
    pub status: ValidatorStatus,
    /// Display metadata.
    pub description: Description,
    /// Height at which the validator was (last) admitted.
    pub admitted_at: u64,
    /// Height at which the validator was removed, if it was.
    pub removed_at: Option<u64>,
}

impl Validator {
    /// Create an active validator admitted at `height`.
    pub fn new(address: Address, power: u64, description: Description, height: u64) -> Self {
        Self {
            address,
            power,
            status: ValidatorStatus::Active,
            description,
            admitted_at: height,
            removed_at: None,
        }
    }

    /// Check whether this validator currently counts toward quorum.
    pub fn is_active(&self) -> bool {
        self.status == ValidatorStatus::Active
    }

    /// Voting power if active, zero otherwise.
    pub fn active_power(&self) -> u64 {
        if self.is_active() {
            self.power
        } else {
            0
        }
    }

    /// Tombstone the validator.
    pub fn remove(&mut self, height: u64) {
        self.status = ValidatorStatus::Removed;
        self.removed_at = Some(height);
    }

    /// Bring a tombstoned validator back after a new approved application.
    pub fn readmit(&mut self, power: u64, description: Description, height: u64) {
        self.status = ValidatorStatus::Active;
        self.power = power;
        self.description = description;
        self.admitted_at = height;
        self.removed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_and_readmit() {
        let mut validator = Validator::new(Address([1; 20]), 10, Description::new("alice"), 0);
        assert!(validator.is_active());
        assert_eq!(validator.active_power(), 10);

        validator.remove(7);
        assert_eq!(validator.status, ValidatorStatus::Removed);
        assert_eq!(validator.removed_at, Some(7));
        assert_eq!(validator.active_power(), 0);
        // Power is kept on the tombstone for audits.
        assert_eq!(validator.power, 10);

        validator.readmit(5, Description::new("alice-2"), 20);
        assert!(validator.is_active());
        assert_eq!(validator.power, 5);
        assert_eq!(validator.admitted_at, 20);
        assert_eq!(validator.removed_at, None);
    }
}
