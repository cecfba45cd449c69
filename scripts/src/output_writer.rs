//! Reading & writing of the contracts manifest

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use json::JsonValue;
use tracing::info;

use crate::{
    artifacts::read_json_file,
    constants::OUTPUT_INDENT,
    dependencies::DependencyManifest,
    deploy::{DeployedContract, DeployedContracts},
    errors::ScriptError,
};

/// The four top level groups of the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKeys {
    /// Addresses of the dependency contracts
    DependencyContracts,
    /// Abis of the dependency contracts
    DependencyAbis,
    /// Addresses of the contracts deployed by the run
    DeployedContracts,
    /// Abis of the contracts deployed by the run
    DeployedAbis,
}

impl OutputKeys {
    /// All groups, in file order
    pub const ALL: [OutputKeys; 4] = [
        OutputKeys::DependencyContracts,
        OutputKeys::DependencyAbis,
        OutputKeys::DeployedContracts,
        OutputKeys::DeployedAbis,
    ];

    /// The json key of the group
    pub fn key(&self) -> &'static str {
        match self {
            OutputKeys::DependencyContracts => "dependencyContracts",
            OutputKeys::DependencyAbis => "dependencyAbis",
            OutputKeys::DeployedContracts => "deployedContracts",
            OutputKeys::DeployedAbis => "deployedAbis",
        }
    }
}

/// The persisted record of every contract the front-end needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputManifest {
    /// SyncSwap addresses, by logical name
    pub dependency_contracts: BTreeMap<String, Address>,
    /// SyncSwap ABIs, by logical name
    pub dependency_abis: BTreeMap<String, JsonValue>,
    /// Our addresses, by contract name
    pub deployed_contracts: BTreeMap<String, Address>,
    /// Our ABIs, by contract name
    pub deployed_abis: BTreeMap<String, JsonValue>,
}

impl OutputManifest {
    /// Flatten the dependencies and the deployed contracts
    pub fn new(dependencies: &DependencyManifest, deployed: &DeployedContracts) -> Self {
        OutputManifest {
            dependency_contracts: dependencies.addresses.clone(),
            dependency_abis: dependencies.abis.clone(),
            deployed_contracts: deployed.addresses(),
            deployed_abis: deployed.abis(),
        }
    }

    /// The dependency part of the manifest
    pub fn dependencies(&self) -> DependencyManifest {
        DependencyManifest {
            addresses: self.dependency_contracts.clone(),
            abis: self.dependency_abis.clone(),
        }
    }

    /// The deployed part of the manifest, a missing abi reads as an empty one
    pub fn deployed(&self) -> DeployedContracts {
        self.deployed_contracts
            .iter()
            .map(|(name, address)| DeployedContract {
                name: name.clone(),
                address: *address,
                abi: self
                    .deployed_abis
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| json::array![]),
            })
            .collect()
    }

    /// Build the json document
    pub fn to_json(&self) -> JsonValue {
        let mut parsed_json = JsonValue::new_object();
        parsed_json[OutputKeys::DependencyContracts.key()] =
            addresses_to_json(&self.dependency_contracts);
        parsed_json[OutputKeys::DependencyAbis.key()] = abis_to_json(&self.dependency_abis);
        parsed_json[OutputKeys::DeployedContracts.key()] =
            addresses_to_json(&self.deployed_contracts);
        parsed_json[OutputKeys::DeployedAbis.key()] = abis_to_json(&self.deployed_abis);
        parsed_json
    }

    /// Parse a json document written by [`OutputManifest::to_json`]
    pub fn from_json(parsed_json: &JsonValue) -> Result<Self, ScriptError> {
        for key in OutputKeys::ALL {
            if !parsed_json[key.key()].is_object() {
                return Err(ScriptError::JsonOutputError(format!(
                    "manifest has no {} object",
                    key.key()
                )));
            }
        }

        Ok(OutputManifest {
            dependency_contracts: addresses_from_json(
                &parsed_json[OutputKeys::DependencyContracts.key()],
            )?,
            dependency_abis: abis_from_json(&parsed_json[OutputKeys::DependencyAbis.key()]),
            deployed_contracts: addresses_from_json(
                &parsed_json[OutputKeys::DeployedContracts.key()],
            )?,
            deployed_abis: abis_from_json(&parsed_json[OutputKeys::DeployedAbis.key()]),
        })
    }
}

/// Read a manifest written by a previous run
pub fn read_output_file(file_path: &Path) -> Result<OutputManifest, ScriptError> {
    if !file_path.is_file() {
        return Err(ScriptError::MissingPrerequisite(
            file_path.display().to_string(),
        ));
    }

    OutputManifest::from_json(&read_json_file(file_path)?)
}

/// Write the manifest, replacing any previous content of the file
pub fn write_output_file(file_path: &Path, manifest: &OutputManifest) -> Result<(), ScriptError> {
    fs::write(
        file_path,
        json::stringify_pretty(manifest.to_json(), OUTPUT_INDENT),
    )
    .map_err(|e| ScriptError::JsonOutputError(format!("{}: {e}", file_path.display())))?;

    info!(
        "Wrote {} deployed and {} dependency contracts to {}",
        manifest.deployed_contracts.len(),
        manifest.dependency_contracts.len(),
        file_path.display()
    );
    Ok(())
}

/// Checksummed addresses as a json object
fn addresses_to_json(addresses: &BTreeMap<String, Address>) -> JsonValue {
    let mut object = JsonValue::new_object();
    for (name, address) in addresses {
        object[name.as_str()] = JsonValue::String(address.to_string());
    }
    object
}

/// ABIs as a json object
fn abis_to_json(abis: &BTreeMap<String, JsonValue>) -> JsonValue {
    let mut object = JsonValue::new_object();
    for (name, abi) in abis {
        object[name.as_str()] = abi.clone();
    }
    object
}

/// Inverse of [`addresses_to_json`]
fn addresses_from_json(object: &JsonValue) -> Result<BTreeMap<String, Address>, ScriptError> {
    object
        .entries()
        .map(|(name, value)| {
            let address = value
                .as_str()
                .and_then(|s| s.parse::<Address>().ok())
                .ok_or_else(|| {
                    ScriptError::JsonOutputError(format!("invalid address for {name}"))
                })?;
            Ok((name.to_string(), address))
        })
        .collect()
}

/// Inverse of [`abis_to_json`]
fn abis_from_json(object: &JsonValue) -> BTreeMap<String, JsonValue> {
    object
        .entries()
        .map(|(name, abi)| (name.to_string(), abi.clone()))
        .collect()
}
