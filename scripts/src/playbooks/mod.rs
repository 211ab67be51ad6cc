//! The per-network deployment playbooks and the runner that executes them
//!
//! Each network has an ordered list of playbooks. The runner executes them in
//! order, skipping those that are filtered out by tag, that have already
//! completed on the network, or whose `skip` hook asks to be skipped.
//!
//! Only deployment playbooks are recorded as completed. Configuration
//! playbooks re-run on every invocation so that changed settings are applied.

pub mod goerli;
pub mod sepolia;

use alloy::dyn_abi::DynSolValue;
use alloy_primitives::Address;
use tracing::info;

use crate::{
    constants::{
        EDGELESS_DEPOSIT, MIGRATIONS_FILE, WRAPPED_ETH_ALIAS, WRAPPED_TOKEN_ARTIFACT,
        WRAPPED_USD_ALIAS,
    },
    env::Deployments,
    errors::ScriptError,
    ledger::DeploymentLedger,
    types::{Deployment, Network},
};

/// A single deployment playbook
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Playbook {
    /// Deploy the deposit vault and register its wrapped tokens on Goerli
    GoerliDeploy,
    /// Deploy and wire the deposit vault, staking manager, and strategies on Sepolia
    SepoliaDeployContracts,
    /// Point the Sepolia deposit vault at its L2 token
    SepoliaSetL2TokenAddresses,
}

impl Playbook {
    /// The playbooks for `network`, in execution order
    pub fn for_network(network: Network) -> &'static [Playbook] {
        match network {
            Network::Goerli => &[Playbook::GoerliDeploy],
            Network::Sepolia => &[
                Playbook::SepoliaDeployContracts,
                Playbook::SepoliaSetL2TokenAddresses,
            ],
        }
    }

    /// The id by which the playbook is logged and its completion recorded
    pub fn id(&self) -> &'static str {
        match self {
            Playbook::GoerliDeploy => goerli::DEPLOY_ID,
            Playbook::SepoliaDeployContracts => sepolia::DEPLOY_CONTRACTS_ID,
            Playbook::SepoliaSetL2TokenAddresses => sepolia::SET_L2_TOKEN_ADDRESSES_ID,
        }
    }

    /// The tags by which the playbook can be selected
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Playbook::GoerliDeploy | Playbook::SepoliaDeployContracts => &["core"],
            Playbook::SepoliaSetL2TokenAddresses => &["l2-tokens"],
        }
    }

    /// Whether completion is recorded in the ledger, so the playbook runs
    /// only once per network unless explicitly rerun
    pub fn runs_once(&self) -> bool {
        match self {
            Playbook::GoerliDeploy | Playbook::SepoliaDeployContracts => true,
            Playbook::SepoliaSetL2TokenAddresses => false,
        }
    }

    /// Whether the playbook should be skipped given the current deployments
    pub async fn skip<D: Deployments>(&self, env: &D) -> Result<bool, ScriptError> {
        match self {
            Playbook::SepoliaDeployContracts => sepolia::skip_deploy_contracts(env),
            Playbook::GoerliDeploy | Playbook::SepoliaSetL2TokenAddresses => Ok(false),
        }
    }

    /// Run the playbook
    pub async fn run<D: Deployments>(&self, env: &mut D) -> Result<(), ScriptError> {
        match self {
            Playbook::GoerliDeploy => goerli::deploy(env).await,
            Playbook::SepoliaDeployContracts => sepolia::deploy_contracts(env).await,
            Playbook::SepoliaSetL2TokenAddresses => sepolia::set_l2_token_addresses(env).await,
        }
    }
}

/// Options controlling which playbooks the runner executes
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Only run playbooks carrying one of these tags, or all if empty
    pub tags: Vec<String>,
    /// Run playbooks even if they have already completed on the network
    pub rerun: bool,
}

impl RunOptions {
    /// Whether the playbook is selected by the tag filter
    fn selects(&self, playbook: Playbook) -> bool {
        self.tags.is_empty()
            || playbook
                .tags()
                .iter()
                .any(|tag| self.tags.iter().any(|t| t == tag))
    }
}

/// Run the playbooks for `network` in order, recording completion of those
/// that [run once](Playbook::runs_once).
///
/// Returns the ids of the playbooks that ran.
pub async fn run_playbooks<D: Deployments>(
    env: &mut D,
    ledger: &DeploymentLedger,
    network: Network,
    options: &RunOptions,
) -> Result<Vec<&'static str>, ScriptError> {
    let mut ran = Vec::new();
    for playbook in Playbook::for_network(network) {
        let id = playbook.id();
        if !options.selects(*playbook) {
            info!("{}: not selected by tags, skipping", id);
            continue;
        }
        if playbook.runs_once() && !options.rerun && ledger.migrations()?.contains_key(id) {
            info!(
                "{}: already completed on {} (see {}), pass --rerun to run it again",
                id,
                network,
                ledger.dir().join(MIGRATIONS_FILE).display()
            );
            continue;
        }
        if playbook.skip(env).await? {
            info!("{}: skip hook returned true, skipping", id);
            continue;
        }

        info!("{}: running", id);
        playbook.run(env).await?;
        if playbook.runs_once() {
            ledger.record_migration(id)?;
        }
        ran.push(id);
    }

    Ok(ran)
}

// -----------
// | Helpers |
// -----------

/// Wrap an address as an ABI value
pub(crate) fn address(addr: Address) -> DynSolValue {
    DynSolValue::Address(addr)
}

/// Register ledger aliases for the wrapped tokens the deposit vault creates
pub(crate) async fn save_wrapped_tokens<D: Deployments>(env: &mut D) -> Result<(), ScriptError> {
    let abi = env.artifact_abi(WRAPPED_TOKEN_ARTIFACT)?;

    let wrapped_eth = env.read_address(EDGELESS_DEPOSIT, "wrappedEth").await?;
    env.save(WRAPPED_ETH_ALIAS, Deployment::new(wrapped_eth, abi.clone()))?;

    let wrapped_usd = env.read_address(EDGELESS_DEPOSIT, "wrappedUSD").await?;
    env.save(WRAPPED_USD_ALIAS, Deployment::new(wrapped_usd, abi))?;

    Ok(())
}
