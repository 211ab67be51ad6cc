//! Per-network configuration: RPC endpoint, expected chain, and named accounts

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use serde::Deserialize;

use crate::{constants::DEFAULT_CONFIRMATIONS, errors::ScriptError};

/// The contents of the network configuration file
#[derive(Clone, Debug, Deserialize)]
pub struct DeployConfig {
    /// The configured networks, by name
    pub networks: HashMap<String, NetworkConfig>,
}

/// Configuration for a single network
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// The RPC endpoint, may be overridden on the command line
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// The chain ID the RPC endpoint is expected to report
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// The number of confirmations to wait for on each transaction
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// The Foundry project root used for source verification
    #[serde(default)]
    pub contracts_dir: Option<PathBuf>,
    /// The accounts the playbooks refer to by name
    pub named_accounts: NamedAccounts,
}

impl NetworkConfig {
    /// The number of confirmations to wait for on each transaction
    pub fn confirmations(&self) -> u64 {
        self.confirmations.unwrap_or(DEFAULT_CONFIRMATIONS)
    }
}

/// Accounts referred to by name in the playbooks
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct NamedAccounts(BTreeMap<String, Address>);

impl NamedAccounts {
    /// Look up the named account, failing if it is not configured
    pub fn get(&self, name: &str) -> Result<Address, ScriptError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| ScriptError::MissingNamedAccount(name.to_string()))
    }

    /// Iterate over all configured accounts
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Address)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Address)> for NamedAccounts {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl DeployConfig {
    /// Read the configuration file at the given path
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;

        Self::parse(&contents)
    }

    /// Parse a configuration from its JSON representation
    pub fn parse(contents: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(contents).map_err(|e| ScriptError::Config(e.to_string()))
    }

    /// Get the configuration of the named network
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ScriptError> {
        self.networks
            .get(name)
            .ok_or_else(|| ScriptError::Config(format!("unknown network {}", name)))
    }
}
