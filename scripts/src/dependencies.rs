//! Loading of the SyncSwap contracts deployed by a previous run

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy::primitives::Address;
use json::JsonValue;
use tracing::{debug, info};

use crate::{
    artifacts::{read_json_file, ContractArtifact},
    constants::DEPENDENCY_ARTIFACTS,
    errors::ScriptError,
};

/// Addresses and abis of the already deployed dependency contracts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyManifest {
    /// Logical name => deployed address
    pub addresses: BTreeMap<String, Address>,
    /// Logical name => abi
    pub abis: BTreeMap<String, JsonValue>,
}

impl DependencyManifest {
    /// Address of the dependency `name`
    pub fn address(&self, name: &str) -> Option<Address> {
        self.addresses.get(name).copied()
    }

    /// Address of the dependency `name`, failing if it wasn't deployed
    pub fn require(&self, name: &str) -> Result<Address, ScriptError> {
        self.address(name).ok_or_else(|| {
            ScriptError::UnresolvedReference(format!("dependency {name} has no address"))
        })
    }
}

/// The SyncSwap artifact files under `artifacts_dir`
pub fn syncswap_artifacts(artifacts_dir: &Path) -> Vec<(String, PathBuf)> {
    DEPENDENCY_ARTIFACTS
        .iter()
        .map(|(name, relative)| (name.to_string(), artifacts_dir.join(relative)))
        .collect()
}

/// Load the dependency addresses file and the given artifacts.
///
/// Every file is checked for existence before anything is parsed, any
/// missing or malformed file aborts the whole load.
pub fn load_dependencies(
    addresses_file: &Path,
    artifacts: &[(String, PathBuf)],
) -> Result<DependencyManifest, ScriptError> {
    // Make sure all files are there
    let missing = std::iter::once(addresses_file)
        .chain(artifacts.iter().map(|(_, path)| path.as_path()))
        .find(|path| !path.is_file());
    if let Some(path) = missing {
        return Err(ScriptError::MissingPrerequisite(path.display().to_string()));
    }

    let addresses =
        read_dependency_addresses(addresses_file).map_err(malformed(addresses_file))?;
    info!("Loaded {} dependency contracts", addresses.len());
    for (name, address) in &addresses {
        debug!("  {name}: {address}");
    }

    // Make sure all files are parsed
    let mut abis = BTreeMap::new();
    for (name, path) in artifacts {
        let artifact = ContractArtifact::from_file(name, path).map_err(malformed(path))?;
        abis.insert(name.clone(), artifact.abi_json);
    }

    Ok(DependencyManifest { addresses, abis })
}

/// Parse errors of a previous run output are fixed by running it again
fn malformed(path: &Path) -> impl Fn(ScriptError) -> ScriptError + '_ {
    move |e| match e {
        ScriptError::Parse(s) if s.starts_with(&path.display().to_string()) => {
            ScriptError::MalformedPrerequisite(s)
        }
        ScriptError::Parse(s) => {
            ScriptError::MalformedPrerequisite(format!("{}: {s}", path.display()))
        }
        e => e,
    }
}

/// Parse a flat `{ name: "0x..." }` json file
fn read_dependency_addresses(path: &Path) -> Result<BTreeMap<String, Address>, ScriptError> {
    let parsed_json = read_json_file(path)?;
    if !parsed_json.is_object() {
        return Err(ScriptError::Parse(format!(
            "{} is not a json object",
            path.display()
        )));
    }

    parsed_json
        .entries()
        .map(|(name, value)| {
            let address = value
                .as_str()
                .ok_or_else(|| ScriptError::Parse(format!("address of {name} is not a string")))?
                .parse::<Address>()
                .map_err(|e| ScriptError::Parse(format!("address of {name}: {e}")))?;
            Ok((name.to_string(), address))
        })
        .collect()
}
