//! Initial governance state.

use crate::crypto::Address;
use crate::params::Params;
use crate::validator::Description;
use serde::{Deserialize, Serialize};

/// A validator present from height zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub address: Address,
    pub power: u64,
    #[serde(default)]
    pub description: Description,
}

/// Parameters and validator set the chain starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    pub validators: Vec<GenesisValidator>,
}

impl GenesisState {
    /// Genesis with default params and equal-power validators.
    pub fn with_validators(addresses: impl IntoIterator<Item = Address>, power: u64) -> Self {
        Self {
            params: Params::default(),
            validators: addresses
                .into_iter()
                .map(|address| GenesisValidator {
                    address,
                    power,
                    description: Description::default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_json_defaults() {
        let json = r#"{
            "validators": [
                { "address": "0x0101010101010101010101010101010101010101", "power": 10 }
            ]
        }"#;
        let genesis: GenesisState = serde_json::from_str(json).unwrap();
        assert_eq!(genesis.params, Params::default());
        assert_eq!(genesis.validators[0].address, Address([1; 20]));
        assert_eq!(genesis.validators[0].description, Description::default());
    }
}
