//! Definitions of errors that can occur during the execution of the deployment playbooks

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy_primitives::Address;

/// Errors that can occur during the execution of the deployment playbooks
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading from the deployment ledger
    ReadDeployments(String),
    /// Error writing to the deployment ledger
    WriteDeployments(String),
    /// Error locating or parsing a compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error loading the network configuration
    Config(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// A contract was referenced before being deployed
    MissingDeployment(String),
    /// A named account was not present in the network configuration
    MissingNamedAccount(String),
    /// No private key was supplied for an account that must sign
    MissingSigner(Address),
    /// The ledger belongs to a different chain than the one connected to
    ChainIdMismatch {
        /// The chain ID recorded in the ledger
        expected: u64,
        /// The chain ID reported by the RPC node
        actual: u64,
    },
    /// A post-deployment check on contract state failed
    DeploymentAssertion(String),
    /// Error verifying contract sources on the block explorer
    Verification(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::Config(s) => write!(f, "error loading config: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::MissingDeployment(s) => write!(f, "no deployment found for {}", s),
            ScriptError::MissingNamedAccount(s) => write!(f, "named account {} not configured", s),
            ScriptError::MissingSigner(addr) => write!(f, "no signer for account {:#x}", addr),
            ScriptError::ChainIdMismatch { expected, actual } => write!(
                f,
                "deployments belong to chain {} but connected to chain {}",
                expected, actual
            ),
            ScriptError::DeploymentAssertion(s) => write!(f, "deployment check failed: {}", s),
            ScriptError::Verification(s) => write!(f, "error verifying contract: {}", s),
        }
    }
}

impl Error for ScriptError {}
