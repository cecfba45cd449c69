//! Record of the contracts a run deployed

use std::collections::BTreeMap;

use alloy::primitives::Address;
use json::JsonValue;

/// A contract confirmed on chain during this run
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedContract {
    /// Logical name, the artifact name
    pub name: String,
    /// Deployed address
    pub address: Address,
    /// Abi as found in the artifact
    pub abi: JsonValue,
}

/// The contracts deployed so far, in deployment order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployedContracts {
    /// The records, never reordered nor mutated once pushed
    records: Vec<DeployedContract>,
}

impl DeployedContracts {
    /// Record a confirmed contract
    pub fn push(&mut self, record: DeployedContract) {
        self.records.push(record);
    }

    /// The record of contract `name`
    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.records.iter().find(|record| record.name == name)
    }

    /// The address of contract `name`
    pub fn address(&self, name: &str) -> Option<Address> {
        self.get(name).map(|record| record.address)
    }

    /// Records in deployment order
    pub fn iter(&self) -> impl Iterator<Item = &DeployedContract> {
        self.records.iter()
    }

    /// Number of deployed contracts
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was deployed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name => address, as written in the manifest
    pub fn addresses(&self) -> BTreeMap<String, Address> {
        self.iter()
            .map(|record| (record.name.clone(), record.address))
            .collect()
    }

    /// Name => abi, as written in the manifest
    pub fn abis(&self) -> BTreeMap<String, JsonValue> {
        self.iter()
            .map(|record| (record.name.clone(), record.abi.clone()))
            .collect()
    }
}

impl FromIterator<DeployedContract> for DeployedContracts {
    fn from_iter<I: IntoIterator<Item = DeployedContract>>(iter: I) -> Self {
        DeployedContracts {
            records: iter.into_iter().collect(),
        }
    }
}
