//! Loading of compiled contract artifacts

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use json::JsonValue;

use crate::{errors::ScriptError, tx::chain::TxPayload};

/// A compiled contract descriptor, as written by the hardhat compiler plugins
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The abi exactly as found in the artifact, written back into the manifest
    pub abi_json: JsonValue,
    /// The parsed abi, used to encode constructor args and calls
    pub abi: JsonAbi,
    /// The creation bytecode, absent for interface-only artifacts
    pub bytecode: Option<Bytes>,
}

impl ContractArtifact {
    /// Read and parse the artifact file at `path`
    pub fn from_file(name: &str, path: &Path) -> Result<Self, ScriptError> {
        let parsed_json = read_json_file(path)?;
        Self::from_json(name, &parsed_json)
    }

    /// Build an artifact from its parsed json content
    pub fn from_json(name: &str, artifact: &JsonValue) -> Result<Self, ScriptError> {
        let abi_json = artifact["abi"].clone();
        if !abi_json.is_array() {
            return Err(ScriptError::Parse(format!(
                "artifact of {name} has no abi array"
            )));
        }
        let abi = serde_json::from_str::<JsonAbi>(&abi_json.dump())
            .map_err(|e| ScriptError::Parse(format!("abi of {name}: {e}")))?;

        // Abstract contracts and interfaces are written with an empty "0x" bytecode
        let bytecode = match artifact["bytecode"].as_str() {
            Some(code) if !code.trim_start_matches("0x").is_empty() => Some(
                code.parse::<Bytes>()
                    .map_err(|e| ScriptError::Parse(format!("bytecode of {name}: {e}")))?,
            ),
            _ => None,
        };

        Ok(ContractArtifact {
            name: name.to_string(),
            abi_json,
            abi,
            bytecode,
        })
    }

    /// The creation of this contract with the abi-encoded constructor arguments
    pub fn deployment(&self, args: &[DynSolValue]) -> Result<TxPayload, ScriptError> {
        let bytecode = self.bytecode.as_ref().ok_or_else(|| {
            ScriptError::Parse(format!("artifact of {} has no bytecode", self.name))
        })?;

        let encoded_args = match self.abi.constructor() {
            Some(constructor) => constructor.abi_encode_input(args).map_err(|e| {
                ScriptError::Parse(format!("constructor args of {}: {e}", self.name))
            })?,
            None if args.is_empty() => Vec::new(),
            None => {
                return Err(ScriptError::Parse(format!(
                    "{} has no constructor but got {} args",
                    self.name,
                    args.len()
                )))
            }
        };

        Ok(TxPayload::create(bytecode.clone(), encoded_args.into()))
    }

    /// Calldata for `function`, picking the overload matching the number of args
    pub fn encode_call(&self, function: &str, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
        let overloads = self.abi.function(function).ok_or_else(|| {
            ScriptError::Parse(format!("{} has no function {function}", self.name))
        })?;
        let func = overloads
            .iter()
            .find(|f| f.inputs.len() == args.len())
            .ok_or_else(|| {
                ScriptError::Parse(format!(
                    "{}.{function} does not take {} args",
                    self.name,
                    args.len()
                ))
            })?;

        func.abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ScriptError::Parse(format!("args of {}.{function}: {e}", self.name)))
    }
}

/// Locates the artifacts of our own contracts, in the hardhat layout
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The artifacts root directory
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    /// `<root>/contracts/<Name>.sol/<Name>.json`
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root
            .join("contracts")
            .join(format!("{name}.sol"))
            .join(format!("{name}.json"))
    }

    /// Load the artifact of contract `name`
    pub fn load(&self, name: &str) -> Result<ContractArtifact, ScriptError> {
        ContractArtifact::from_file(name, &self.path_of(name))
    }
}

/// Parses the JSON file at the given path
pub(crate) fn read_json_file(path: &Path) -> Result<JsonValue, ScriptError> {
    let file_contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::MissingPrerequisite(format!("{} ({e})", path.display())))?;

    json::parse(&file_contents)
        .map_err(|e| ScriptError::Parse(format!("{}: {e}", path.display())))
}
