//! Type definitions used throughout the playbooks

use std::fmt::{self, Display};

use alloy::{dyn_abi::DynSolValue, json_abi::JsonAbi};
use alloy_primitives::{Address, Bytes, B256, U256};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The networks playbooks are defined for
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Network {
    /// The Goerli testnet
    Goerli,
    /// The Sepolia testnet
    Sepolia,
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Goerli => write!(f, "goerli"),
            Network::Sepolia => write!(f, "sepolia"),
        }
    }
}

/// A record in the deployment ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// The on-chain address of the contract
    pub address: Address,
    /// The interface with which to call the contract
    pub abi: JsonAbi,
    /// The hash of the transaction that created the contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// For a proxied contract, the address of its current implementation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Address>,
    /// The artifact the contract was compiled from, used for source verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    /// The ABI-encoded constructor arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_args: Option<Bytes>,
    /// The keccak256 hash of the creation bytecode, used to detect changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<B256>,
}

impl Deployment {
    /// A bare record consisting only of an address and an interface,
    /// as saved for contracts created by other contracts
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self {
            address,
            abi,
            transaction_hash: None,
            implementation: None,
            contract_name: None,
            constructor_args: None,
            bytecode_hash: None,
        }
    }
}

/// The proxy pattern a contract is deployed behind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyKind {
    /// An ERC-1967 proxy whose upgrade logic lives in the implementation
    Uups,
    /// An OpenZeppelin v5 transparent proxy, administered through a `ProxyAdmin`
    Transparent,
}

/// A method invocation, by name and arguments
#[derive(Clone, Debug, PartialEq)]
pub struct MethodCall {
    /// The name of the method
    pub method_name: String,
    /// The arguments to pass
    pub args: Vec<DynSolValue>,
}

/// How to place a contract behind a proxy
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyOptions {
    /// The proxy pattern
    pub kind: ProxyKind,
    /// The account authorized to upgrade the proxy, defaults to the deployer
    pub owner: Option<Address>,
    /// The initializer executed through the proxy when it is first created
    pub init: Option<MethodCall>,
}

impl ProxyOptions {
    /// A UUPS proxy without an initializer
    pub fn uups() -> Self {
        Self {
            kind: ProxyKind::Uups,
            owner: None,
            init: None,
        }
    }

    /// A transparent proxy without an initializer
    pub fn transparent() -> Self {
        Self {
            kind: ProxyKind::Transparent,
            owner: None,
            init: None,
        }
    }

    /// Run the given initializer when the proxy is created
    pub fn with_init(mut self, method_name: &str, args: Vec<DynSolValue>) -> Self {
        self.init = Some(MethodCall {
            method_name: method_name.to_string(),
            args,
        });
        self
    }

    /// Set the account authorized to upgrade the proxy
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Options for [`crate::env::Deployments::deploy`]
#[derive(Clone, Debug, PartialEq)]
pub struct DeployOptions {
    /// The account sending the deployment transactions
    pub from: Address,
    /// The artifact to deploy, defaults to the deployment name
    pub contract: Option<String>,
    /// The constructor arguments
    pub args: Vec<DynSolValue>,
    /// Whether, and how, to deploy behind a proxy
    pub proxy: Option<ProxyOptions>,
    /// Leave an existing deployment untouched even if its bytecode changed
    pub skip_if_already_deployed: bool,
    /// Log the deployment
    pub log: bool,
}

impl DeployOptions {
    /// Deploy from the given account, with no arguments and no proxy
    pub fn new(from: Address) -> Self {
        Self {
            from,
            contract: None,
            args: Vec::new(),
            proxy: None,
            skip_if_already_deployed: false,
            log: false,
        }
    }

    /// Deploy behind the given proxy
    pub fn with_proxy(mut self, proxy: ProxyOptions) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Deploy a differently named artifact
    pub fn with_contract(mut self, contract: &str) -> Self {
        self.contract = Some(contract.to_string());
        self
    }

    /// Pass the given constructor arguments
    pub fn with_args(mut self, args: Vec<DynSolValue>) -> Self {
        self.args = args;
        self
    }

    /// Leave existing deployments untouched
    pub fn skip_if_already_deployed(mut self) -> Self {
        self.skip_if_already_deployed = true;
        self
    }

    /// Log the deployment
    pub fn logged(mut self) -> Self {
        self.log = true;
        self
    }

    /// The artifact name to deploy for the deployment `name`
    pub fn artifact_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.contract.as_deref().unwrap_or(name)
    }
}

/// The outcome of a call to [`crate::env::Deployments::deploy`]
#[derive(Clone, Debug, PartialEq)]
pub struct DeployResult {
    /// The ledger record of the deployment
    pub deployment: Deployment,
    /// Whether any transaction was sent
    pub newly_deployed: bool,
}

/// Options for [`crate::env::Deployments::execute`]
#[derive(Clone, Debug, PartialEq)]
pub struct ExecuteOptions {
    /// The account sending the transaction
    pub from: Address,
    /// Log the transaction
    pub log: bool,
    /// The ether value to attach
    pub value: Option<U256>,
}

impl ExecuteOptions {
    /// Execute from the given account, logging the transaction
    pub fn logged(from: Address) -> Self {
        Self {
            from,
            log: true,
            value: None,
        }
    }
}

/// A summary of a mined transaction
#[derive(Clone, Debug, PartialEq)]
pub struct TxSummary {
    /// The transaction hash
    pub tx_hash: B256,
    /// The gas used by the transaction
    pub gas_used: u64,
}
