//! The deployment environment the playbooks run against.
//!
//! [`Deployments`] is the narrow deploy / read / execute surface the playbooks
//! are written against. [`ChainDeployments`] implements it on top of an RPC
//! provider, a [`DeploymentLedger`] and an [`ArtifactStore`].

use std::{str::FromStr, time::Duration};

use alloy::{
    contract::{ContractInstance, Interface},
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    network::TransactionBuilder,
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use itertools::Itertools;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::{
    artifacts::{Artifact, ArtifactStore},
    config::{NamedAccounts, NetworkConfig},
    constants::{
        ERC1967_PROXY_ARTIFACT, IMPLEMENTATION_SUFFIX, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT,
        PROXY_ADMIN_STORAGE_SLOT, PROXY_SUFFIX, RECEIPT_POLL_INTERVAL_MS, RECEIPT_TIMEOUT_SECS,
        TRANSPARENT_PROXY_ARTIFACT,
    },
    errors::ScriptError,
    ledger::DeploymentLedger,
    solidity::{IProxyAdmin, IUUPSUpgradeable},
    types::{
        DeployOptions, DeployResult, Deployment, ExecuteOptions, ProxyKind, ProxyOptions,
        TxSummary,
    },
    utils::{encode_constructor_args, encode_function_call, find_function, format_args},
    verify::Verifier,
};

/// The operations a playbook may perform against a network
#[allow(async_fn_in_trait)]
pub trait Deployments {
    /// The accounts configured for the network
    fn named_accounts(&self) -> &NamedAccounts;

    /// Look up a named account
    fn account(&self, name: &str) -> Result<Address, ScriptError> {
        self.named_accounts().get(name)
    }

    /// Get the ledger record for `name`, if one exists
    fn get_or_null(&self, name: &str) -> Result<Option<Deployment>, ScriptError>;

    /// Get the ledger record for `name`, failing if it has not been deployed
    fn get(&self, name: &str) -> Result<Deployment, ScriptError> {
        self.get_or_null(name)?
            .ok_or_else(|| ScriptError::MissingDeployment(name.to_string()))
    }

    /// Register a record in the ledger under `name`
    fn save(&mut self, name: &str, deployment: Deployment) -> Result<(), ScriptError>;

    /// The interface of a compiled contract
    fn artifact_abi(&self, contract: &str) -> Result<JsonAbi, ScriptError>;

    /// Deploy the contract `name`, or reuse the existing deployment
    async fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<DeployResult, ScriptError>;

    /// Call a view method on a deployed contract
    async fn read(
        &self,
        name: &str,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ScriptError>;

    /// Call an argument-less view method returning a single address
    async fn read_address(&self, name: &str, method: &str) -> Result<Address, ScriptError> {
        self.read(name, method, &[])
            .await?
            .first()
            .and_then(DynSolValue::as_address)
            .ok_or_else(|| {
                ScriptError::ContractInteraction(format!(
                    "{}.{} did not return an address",
                    name, method
                ))
            })
    }

    /// Send a transaction invoking a method on a deployed contract
    async fn execute(
        &mut self,
        name: &str,
        options: ExecuteOptions,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<TxSummary, ScriptError>;

    /// Verify the sources of all deployed contracts on the block explorer
    async fn verify(&self) -> Result<(), ScriptError>;

    /// Log a message from a playbook
    fn log(&self, message: &str) {
        info!("{}", message);
    }
}

/// A [`Deployments`] implementation that sends real transactions
pub struct ChainDeployments {
    /// The client used to send transactions
    provider: DynProvider,
    /// The accounts the client can sign for
    signers: Vec<Address>,
    /// The accounts configured for the network
    named_accounts: NamedAccounts,
    /// The number of confirmations to wait for on each transaction
    confirmations: u64,
    /// The network's deployment ledger
    ledger: DeploymentLedger,
    /// Where compiled contracts are loaded from
    artifacts: ArtifactStore,
    /// Explorer source verification
    verifier: Verifier,
}

impl ChainDeployments {
    /// Set up the environment, checking that the RPC endpoint serves the
    /// chain both the config and the ledger expect
    pub async fn connect(
        provider: DynProvider,
        signers: Vec<Address>,
        config: &NetworkConfig,
        ledger: DeploymentLedger,
        artifacts: ArtifactStore,
        verifier: Verifier,
    ) -> Result<Self, ScriptError> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

        if let Some(expected) = config.chain_id.filter(|expected| *expected != chain_id) {
            return Err(ScriptError::ChainIdMismatch {
                expected,
                actual: chain_id,
            });
        }
        ledger.check_chain_id(chain_id)?;

        info!(
            "connected to chain {} with signers [{}]",
            chain_id,
            signers.iter().map(|s| format!("{:#x}", s)).join(", ")
        );

        Ok(Self {
            provider,
            signers,
            named_accounts: config.named_accounts.clone(),
            confirmations: config.confirmations(),
            ledger,
            artifacts,
            verifier: verifier.with_chain_id(chain_id),
        })
    }

    /// Fail unless the client can sign for `from`
    fn ensure_signer(&self, from: Address) -> Result<(), ScriptError> {
        if self.signers.contains(&from) {
            Ok(())
        } else {
            Err(ScriptError::MissingSigner(from))
        }
    }

    /// Wait for a sent transaction to be mined with the configured number of
    /// confirmations, failing if it reverted
    async fn confirm(
        &self,
        tx_hash: TxHash,
        context: &str,
    ) -> Result<TransactionReceipt, ScriptError> {
        let rpc_err =
            |e: TransportError| ScriptError::ContractInteraction(format!("{}: {}", context, e));
        let poll_interval = Duration::from_millis(RECEIPT_POLL_INTERVAL_MS);

        let wait = async {
            let receipt = loop {
                if let Some(receipt) =
                    self.provider.get_transaction_receipt(tx_hash).await.map_err(rpc_err)?
                {
                    break receipt;
                }
                debug!("{}: waiting for tx {:#x} to be mined", context, tx_hash);
                sleep(poll_interval).await;
            };

            if self.confirmations > 1 {
                let mined_in = receipt.block_number.unwrap_or_default();
                let target = mined_in + self.confirmations - 1;
                while self.provider.get_block_number().await.map_err(rpc_err)? < target {
                    sleep(poll_interval).await;
                }
            }

            Ok::<_, ScriptError>(receipt)
        };

        let receipt = timeout(Duration::from_secs(RECEIPT_TIMEOUT_SECS), wait)
            .await
            .map_err(|_| {
                ScriptError::ContractInteraction(format!(
                    "{}: timed out waiting for tx {:#x}",
                    context, tx_hash
                ))
            })??;

        if !receipt.status() {
            return Err(ScriptError::ContractInteraction(format!(
                "{} reverted in tx {:#x}",
                context, receipt.transaction_hash
            )));
        }

        Ok(receipt)
    }

    /// Deploy an artifact under the ledger name `name`, unless a record with
    /// identical bytecode and constructor arguments already exists.
    ///
    /// Returns the record and whether a new contract was created.
    async fn deploy_artifact(
        &mut self,
        name: &str,
        artifact: &Artifact,
        args: &[DynSolValue],
        from: Address,
        log: bool,
    ) -> Result<(Deployment, bool), ScriptError> {
        let bytecode_hash = artifact.bytecode_hash();
        let constructor_args = encode_constructor_args(&artifact.abi, args)?;

        if let Some(existing) = self.ledger.get(name)? {
            if existing.bytecode_hash == Some(bytecode_hash)
                && existing.constructor_args.as_ref() == Some(&constructor_args)
            {
                if log {
                    info!("reusing \"{}\" at {:#x}", name, existing.address);
                }
                return Ok((existing, false));
            }
        }

        self.ensure_signer(from)?;
        let code = [artifact.bytecode.as_ref(), constructor_args.as_ref()].concat();
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(code);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractDeployment(format!("{}: {}", name, e)))?;
        let tx_hash = *pending.tx_hash();
        if log {
            info!("deploying \"{}\" (tx: {:#x})...", name, tx_hash);
        }

        let receipt = self.confirm(tx_hash, name).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!("{}: no contract address in receipt", name))
        })?;
        if log {
            info!(
                "deployed \"{}\" at {:#x} with {} gas",
                name, address, receipt.gas_used
            );
        }

        let deployment = Deployment {
            address,
            abi: artifact.abi.clone(),
            transaction_hash: Some(tx_hash),
            implementation: None,
            contract_name: Some(artifact.name.clone()),
            constructor_args: Some(constructor_args),
            bytecode_hash: Some(bytecode_hash),
        };
        self.ledger.save(name, &deployment)?;

        Ok((deployment, true))
    }

    /// Deploy `artifact` behind a proxy, upgrading an existing proxy if the
    /// implementation changed
    async fn deploy_proxied(
        &mut self,
        name: &str,
        artifact: &Artifact,
        options: &DeployOptions,
        proxy: &ProxyOptions,
    ) -> Result<DeployResult, ScriptError> {
        let owner = proxy.owner.unwrap_or(options.from);
        let implementation_name = format!("{}{}", name, IMPLEMENTATION_SUFFIX);
        let proxy_name = format!("{}{}", name, PROXY_SUFFIX);

        let (implementation, implementation_changed) = self
            .deploy_artifact(
                &implementation_name,
                artifact,
                &options.args,
                options.from,
                options.log,
            )
            .await?;

        let (proxy_deployment, proxy_created) = match self.ledger.get(&proxy_name)? {
            Some(existing) => {
                if implementation_changed {
                    self.upgrade(proxy.kind, &existing, implementation.address, owner)
                        .await?;
                    if options.log {
                        info!(
                            "upgraded \"{}\" to implementation {:#x}",
                            name, implementation.address
                        );
                    }
                }
                (existing, false)
            }
            None => {
                // The initializer runs inside the proxy constructor, so it can
                // never be executed a second time
                let init_data = match &proxy.init {
                    Some(call) => encode_function_call(&artifact.abi, &call.method_name, &call.args)?,
                    None => Bytes::new(),
                };
                if let (Some(call), true) = (&proxy.init, options.log) {
                    info!(
                        "initializing \"{}\" with {}({})",
                        name,
                        call.method_name,
                        format_args(&call.args)
                    );
                }

                let (proxy_artifact, proxy_args) = match proxy.kind {
                    ProxyKind::Uups => (
                        self.artifacts.load(ERC1967_PROXY_ARTIFACT)?,
                        vec![
                            DynSolValue::Address(implementation.address),
                            DynSolValue::Bytes(init_data.to_vec()),
                        ],
                    ),
                    ProxyKind::Transparent => (
                        self.artifacts.load(TRANSPARENT_PROXY_ARTIFACT)?,
                        vec![
                            DynSolValue::Address(implementation.address),
                            DynSolValue::Address(owner),
                            DynSolValue::Bytes(init_data.to_vec()),
                        ],
                    ),
                };

                let (deployment, _) = self
                    .deploy_artifact(
                        &proxy_name,
                        &proxy_artifact,
                        &proxy_args,
                        options.from,
                        options.log,
                    )
                    .await?;
                (deployment, true)
            }
        };

        let mut deployment = Deployment::new(proxy_deployment.address, artifact.abi.clone());
        deployment.transaction_hash = proxy_deployment.transaction_hash;
        deployment.implementation = Some(implementation.address);
        self.ledger.save(name, &deployment)?;

        Ok(DeployResult {
            deployment,
            newly_deployed: implementation_changed || proxy_created,
        })
    }

    /// Point an existing proxy at a new implementation
    async fn upgrade(
        &self,
        kind: ProxyKind,
        proxy: &Deployment,
        implementation: Address,
        owner: Address,
    ) -> Result<(), ScriptError> {
        self.ensure_signer(owner)?;

        let pending = match kind {
            ProxyKind::Uups => IUUPSUpgradeable::new(proxy.address, self.provider.clone())
                .upgradeToAndCall(implementation, Bytes::new())
                .from(owner)
                .send()
                .await,
            ProxyKind::Transparent => {
                let admin = self.proxy_admin(proxy.address).await?;
                IProxyAdmin::new(admin, self.provider.clone())
                    .upgradeAndCall(proxy.address, implementation, Bytes::new())
                    .from(owner)
                    .send()
                    .await
            }
        }
        .map_err(|e| ScriptError::ContractInteraction(format!("upgrade: {}", e)))?;

        self.confirm(*pending.tx_hash(), "upgrade").await?;
        Ok(())
    }

    /// Get the proxy admin contract address of a transparent proxy.
    ///
    /// This is the recommended way to get the proxy admin address:
    /// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    async fn proxy_admin(&self, proxy: Address) -> Result<Address, ScriptError> {
        let slot = U256::from_str(PROXY_ADMIN_STORAGE_SLOT)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
        let word = self
            .provider
            .get_storage_at(proxy, slot)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(Address::from_slice(
            &word.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>()
                [NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
        ))
    }
}

impl Deployments for ChainDeployments {
    fn named_accounts(&self) -> &NamedAccounts {
        &self.named_accounts
    }

    fn get_or_null(&self, name: &str) -> Result<Option<Deployment>, ScriptError> {
        self.ledger.get(name)
    }

    fn save(&mut self, name: &str, deployment: Deployment) -> Result<(), ScriptError> {
        info!("saving \"{}\" at {:#x}", name, deployment.address);
        self.ledger.save(name, &deployment)
    }

    fn artifact_abi(&self, contract: &str) -> Result<JsonAbi, ScriptError> {
        Ok(self.artifacts.load(contract)?.abi)
    }

    async fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<DeployResult, ScriptError> {
        if options.skip_if_already_deployed {
            if let Some(deployment) = self.ledger.get(name)? {
                if options.log {
                    info!("reusing \"{}\" at {:#x}", name, deployment.address);
                }
                return Ok(DeployResult {
                    deployment,
                    newly_deployed: false,
                });
            }
        }

        let artifact = self.artifacts.load(options.artifact_name(name))?;
        match &options.proxy {
            Some(proxy) => self.deploy_proxied(name, &artifact, &options, proxy).await,
            None => {
                let (deployment, newly_deployed) = self
                    .deploy_artifact(name, &artifact, &options.args, options.from, options.log)
                    .await?;
                Ok(DeployResult {
                    deployment,
                    newly_deployed,
                })
            }
        }
    }

    async fn read(
        &self,
        name: &str,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        let deployment = self.get(name)?;
        let selector = find_function(&deployment.abi, method, args.len())?.selector();
        let contract = ContractInstance::new(
            deployment.address,
            self.provider.clone(),
            Interface::new(deployment.abi),
        );

        contract
            .function_from_selector(&selector, args)
            .map_err(|e| ScriptError::CalldataConstruction(format!("{}.{}: {}", name, method, e)))?
            .call()
            .await
            .map_err(|e| ScriptError::ContractInteraction(format!("{}.{}: {}", name, method, e)))
    }

    async fn execute(
        &mut self,
        name: &str,
        options: ExecuteOptions,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<TxSummary, ScriptError> {
        let deployment = self.get(name)?;
        self.ensure_signer(options.from)?;

        // Overloads are told apart by arity
        let selector = find_function(&deployment.abi, method, args.len())?.selector();
        let contract = ContractInstance::new(
            deployment.address,
            self.provider.clone(),
            Interface::new(deployment.abi),
        );
        let mut call = contract
            .function_from_selector(&selector, args)
            .map_err(|e| ScriptError::CalldataConstruction(format!("{}.{}: {}", name, method, e)))?
            .from(options.from);
        if let Some(value) = options.value {
            call = call.value(value);
        }

        let context = format!("{}.{}", name, method);
        let pending = call
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(format!("{}: {}", context, e)))?;
        let receipt = self.confirm(*pending.tx_hash(), &context).await?;

        if options.log {
            info!(
                "executed {}({}) (tx: {:#x}) with {} gas",
                context,
                format_args(args),
                receipt.transaction_hash,
                receipt.gas_used
            );
        }

        Ok(TxSummary {
            tx_hash: receipt.transaction_hash,
            gas_used: receipt.gas_used,
        })
    }

    async fn verify(&self) -> Result<(), ScriptError> {
        if !self.verifier.has_api_key() {
            warn!("no explorer API key configured, skipping verification");
            return Ok(());
        }

        self.verifier.verify_all(&self.ledger.all()?)
    }
}
