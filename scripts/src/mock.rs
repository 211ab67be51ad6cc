//! An in-memory [`Deployments`] that records the calls a playbook makes

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use alloy::{dyn_abi::DynSolValue, json_abi::JsonAbi};
use alloy_primitives::{Address, B256};

use crate::{
    config::NamedAccounts,
    constants::{
        DAI_STRATEGY, DEPLOYER, EDGELESS_DEPOSIT, L1_STANDARD_BRIDGE, L2_USD, OWNER, STAKER,
        STAKING_MANAGER,
    },
    env::Deployments,
    errors::ScriptError,
    types::{DeployOptions, DeployResult, Deployment, ExecuteOptions, TxSummary},
};

/// A state-changing call made against the mock
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    /// A call to `deploy`
    Deploy {
        /// The deployment name
        name: String,
        /// The options passed
        options: DeployOptions,
    },
    /// A call to `execute`
    Execute {
        /// The contract called
        name: String,
        /// The sender
        from: Address,
        /// The method called
        method: String,
        /// The arguments passed
        args: Vec<DynSolValue>,
    },
    /// A call to `save`
    Save {
        /// The alias saved
        name: String,
        /// The address saved under it
        address: Address,
    },
    /// A call to `verify`
    Verify,
}

impl Call {
    /// A `deploy` call
    pub fn deploy(name: &str, options: DeployOptions) -> Self {
        Call::Deploy {
            name: name.to_string(),
            options,
        }
    }

    /// An `execute` call
    pub fn execute(name: &str, from: Address, method: &str, args: Vec<DynSolValue>) -> Self {
        Call::Execute {
            name: name.to_string(),
            from,
            method: method.to_string(),
            args,
        }
    }
}

/// Records playbook calls and serves canned view results
pub(crate) struct MockDeployments {
    /// The configured accounts
    accounts: NamedAccounts,
    /// The ledger
    records: HashMap<String, Deployment>,
    /// Names deployed by the mock, as opposed to inserted up front
    created: HashSet<String>,
    /// Canned results for `read`, keyed by contract and method
    reads: HashMap<(String, String), Vec<DynSolValue>>,
    /// The state-changing calls made so far
    calls: RefCell<Vec<Call>>,
    /// The byte the next deployed address is filled with
    next_address: u8,
}

impl MockDeployments {
    /// The address of contracts inserted before a playbook runs
    pub const PREDEPLOYED: Address = Address::new([0xaa; 20]);
    /// The wrapped ETH token created by the deposit vault
    pub const WRAPPED_ETH: Address = Address::new([0xe1; 20]);
    /// The wrapped USD token created by the deposit vault
    pub const WRAPPED_USD: Address = Address::new([0xe2; 20]);
    /// The staking manager's placeholder address for ether
    pub const ETH_ADDRESS: Address = Address::new([0xee; 20]);
    /// The DAI strategy's underlying asset
    pub const DAI_ADDRESS: Address = Address::new([0xda; 20]);

    /// A mock whose contracts report the roles and tokens the playbooks expect
    pub fn new() -> Self {
        let accounts: NamedAccounts = [DEPLOYER, OWNER, STAKER, L1_STANDARD_BRIDGE, L2_USD]
            .into_iter()
            .zip(1u8..)
            .map(|(name, byte)| (name.to_string(), Address::with_last_byte(byte)))
            .collect();

        let mut mock = Self {
            accounts,
            records: HashMap::new(),
            created: HashSet::new(),
            reads: HashMap::new(),
            calls: RefCell::new(Vec::new()),
            next_address: 0x10,
        };

        let staker = mock.account(STAKER).unwrap();
        let owner = mock.account(OWNER).unwrap();
        mock.set_read(STAKING_MANAGER, "staker", staker);
        mock.set_read(STAKING_MANAGER, "owner", owner);
        mock.set_read(STAKING_MANAGER, "ETH_ADDRESS", Self::ETH_ADDRESS);
        mock.set_read(DAI_STRATEGY, "underlyingAsset", Self::DAI_ADDRESS);
        mock.set_read(EDGELESS_DEPOSIT, "wrappedEth", Self::WRAPPED_ETH);
        mock.set_read(EDGELESS_DEPOSIT, "wrappedUSD", Self::WRAPPED_USD);
        mock
    }

    /// Remove a named account from the configuration
    pub fn without_account(mut self, name: &str) -> Self {
        self.accounts = self
            .accounts
            .iter()
            .filter(|(n, _)| n.as_str() != name)
            .map(|(n, addr)| (n.clone(), *addr))
            .collect();
        self
    }

    /// Record `name` as deployed at [`Self::PREDEPLOYED`]
    pub fn insert(&mut self, name: &str) {
        self.records.insert(
            name.to_string(),
            Deployment::new(Self::PREDEPLOYED, JsonAbi::new()),
        );
    }

    /// Have `name.method()` return `value`
    pub fn set_read(&mut self, name: &str, method: &str, value: Address) {
        self.reads.insert(
            (name.to_string(), method.to_string()),
            vec![DynSolValue::Address(value)],
        );
    }

    /// Have `name.method()` fail
    pub fn clear_read(&mut self, name: &str, method: &str) {
        self.reads.remove(&(name.to_string(), method.to_string()));
    }

    /// The deployer account
    pub fn deployer(&self) -> Address {
        self.account(DEPLOYER).unwrap()
    }

    /// The state-changing calls made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Whether the mock created `name`, rather than it being inserted up front
    pub fn newly_deployed(&self, name: &str) -> bool {
        self.created.contains(name)
    }
}

impl Deployments for MockDeployments {
    fn named_accounts(&self) -> &NamedAccounts {
        &self.accounts
    }

    fn get_or_null(&self, name: &str) -> Result<Option<Deployment>, ScriptError> {
        Ok(self.records.get(name).cloned())
    }

    fn save(&mut self, name: &str, deployment: Deployment) -> Result<(), ScriptError> {
        self.calls.borrow_mut().push(Call::Save {
            name: name.to_string(),
            address: deployment.address,
        });
        self.records.insert(name.to_string(), deployment);
        Ok(())
    }

    fn artifact_abi(&self, _contract: &str) -> Result<JsonAbi, ScriptError> {
        Ok(JsonAbi::new())
    }

    async fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<DeployResult, ScriptError> {
        self.calls
            .borrow_mut()
            .push(Call::deploy(name, options.clone()));

        if let Some(existing) = self.records.get(name) {
            if options.skip_if_already_deployed {
                return Ok(DeployResult {
                    deployment: existing.clone(),
                    newly_deployed: false,
                });
            }
        }

        let mut deployment =
            Deployment::new(Address::repeat_byte(self.next_address), JsonAbi::new());
        if options.proxy.is_some() {
            deployment.implementation = Some(Address::repeat_byte(self.next_address + 1));
        }
        self.next_address += 2;

        self.records.insert(name.to_string(), deployment.clone());
        self.created.insert(name.to_string());
        Ok(DeployResult {
            deployment,
            newly_deployed: true,
        })
    }

    async fn read(
        &self,
        name: &str,
        method: &str,
        _args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        self.get(name)?;
        self.reads
            .get(&(name.to_string(), method.to_string()))
            .cloned()
            .ok_or_else(|| ScriptError::ContractInteraction(format!("{}.{} reverted", name, method)))
    }

    async fn execute(
        &mut self,
        name: &str,
        options: ExecuteOptions,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<TxSummary, ScriptError> {
        self.get(name)?;
        self.calls
            .borrow_mut()
            .push(Call::execute(name, options.from, method, args.to_vec()));

        Ok(TxSummary {
            tx_hash: B256::ZERO,
            gas_used: 0,
        })
    }

    async fn verify(&self) -> Result<(), ScriptError> {
        self.calls.borrow_mut().push(Call::Verify);
        Ok(())
    }
}
