//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// The hint appended to every missing or malformed prerequisite error
const PREREQUISITE_HINT: &str = "Please run `yarn deploy:local` first";

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// A file produced by a previous run is missing or unreadable
    MissingPrerequisite(String),
    /// A file produced by a previous run can't be parsed
    MalformedPrerequisite(String),
    /// Error parsing a json file, an address, some bytecode or an abi
    Parse(String),
    /// Error in the run configuration (missing private key, bad url...)
    Config(String),
    /// Error when creating the client
    ClientInitialization(String),
    /// A plan step references a contract that isn't available yet
    UnresolvedReference(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// Error estimating a deployment fee
    FeeEstimation(String),
    /// An awaited event never arrived
    Timeout(String),
    /// Error when building output file
    JsonOutputError(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::MissingPrerequisite(s) => {
                write!(f, "missing prerequisite {}: {}", s, PREREQUISITE_HINT)
            }
            ScriptError::MalformedPrerequisite(s) => {
                write!(f, "malformed prerequisite {}: {}", s, PREREQUISITE_HINT)
            }
            ScriptError::Parse(s) => write!(f, "error parsing input: {}", s),
            ScriptError::Config(s) => write!(f, "invalid configuration: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error during client init: {}", s),
            ScriptError::UnresolvedReference(s) => {
                write!(f, "unresolved contract reference: {}", s)
            }
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::FeeEstimation(s) => write!(f, "error estimating fee: {}", s),
            ScriptError::Timeout(s) => write!(f, "timeout: {}", s),
            ScriptError::JsonOutputError(s) => write!(f, "error writing json output: {}", s),
        }
    }
}

impl Error for ScriptError {}
