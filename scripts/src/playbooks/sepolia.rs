//! Sepolia playbooks

use alloy::dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};

use crate::{
    constants::{
        DAI_STRATEGY, DEPLOYER, EDGELESS_DEPOSIT, ETH_STRATEGY, INITIALIZER, L1_STANDARD_BRIDGE,
        L2_USD, OWNER, STAKER, STAKING_MANAGER,
    },
    env::Deployments,
    errors::ScriptError,
    types::{DeployOptions, ExecuteOptions, ProxyOptions},
};

use super::{address, save_wrapped_tokens};

/// The id of [`deploy_contracts`]
pub const DEPLOY_CONTRACTS_ID: &str = "001_deploy_contracts";

/// The id of [`set_l2_token_addresses`]
pub const SET_L2_TOKEN_ADDRESSES_ID: &str = "002_set_l2_token_addresses";

/// The index of the strategy made active for each asset
const ACTIVE_STRATEGY_INDEX: u64 = 0;

/// [`deploy_contracts`] only runs on a network without a deposit vault
pub fn skip_deploy_contracts<D: Deployments>(env: &D) -> Result<bool, ScriptError> {
    let deployed = env.get_or_null(EDGELESS_DEPOSIT)?.is_some();
    if deployed {
        env.log("EdgelessDeposit already deployed, skipping...");
    }

    Ok(deployed)
}

/// Deploy the staking manager, deposit vault, and yield strategies behind
/// UUPS proxies, and wire them to one another.
///
/// Run through [`crate::playbooks::run_playbooks`], which consults
/// [`skip_deploy_contracts`] first.
pub async fn deploy_contracts<D: Deployments>(env: &mut D) -> Result<(), ScriptError> {
    let deployer = env.account(DEPLOYER)?;
    let owner = env.account(OWNER)?;
    let staker = env.account(STAKER)?;
    let l1_standard_bridge = env.account(L1_STANDARD_BRIDGE)?;

    // --- Staking Manager --- //

    env.deploy(
        STAKING_MANAGER,
        uups_deploy(deployer, vec![address(owner), address(staker)]),
    )
    .await?;
    assert_staking_manager_roles(env, owner, staker).await?;
    let staking_manager = env.get(STAKING_MANAGER)?.address;

    // --- Deposit Vault --- //

    env.deploy(
        EDGELESS_DEPOSIT,
        uups_deploy(
            deployer,
            vec![
                address(owner),
                address(staker),
                address(l1_standard_bridge),
                address(staking_manager),
            ],
        ),
    )
    .await?;
    save_wrapped_tokens(env).await?;

    let deposit = env.get(EDGELESS_DEPOSIT)?.address;
    let as_owner = ExecuteOptions::logged(owner);
    env.execute(STAKING_MANAGER, as_owner.clone(), "setStaker", &[address(deposit)])
        .await?;
    env.execute(STAKING_MANAGER, as_owner.clone(), "setDepositor", &[address(deposit)])
        .await?;

    // --- Strategies --- //

    deploy_strategy(env, ETH_STRATEGY, deployer, owner, staking_manager).await?;
    let eth_address = env.read_address(STAKING_MANAGER, "ETH_ADDRESS").await?;
    activate_strategy(env, ETH_STRATEGY, owner, eth_address).await?;

    deploy_strategy(env, DAI_STRATEGY, deployer, owner, staking_manager).await?;
    let dai_address = env.read_address(DAI_STRATEGY, "underlyingAsset").await?;
    activate_strategy(env, DAI_STRATEGY, owner, dai_address).await?;

    Ok(())
}

/// Point the deposit vault at the L2 USD token
pub async fn set_l2_token_addresses<D: Deployments>(env: &mut D) -> Result<(), ScriptError> {
    if env.get_or_null(EDGELESS_DEPOSIT)?.is_none() {
        env.log("EdgelessDeposit not found, make sure to deploy it first");
        return Ok(());
    }

    let deployer = env.account(DEPLOYER)?;
    let l2_usd = env.account(L2_USD)?;
    env.execute(
        EDGELESS_DEPOSIT,
        ExecuteOptions::logged(deployer),
        "setL2USD",
        &[address(l2_usd)],
    )
    .await?;

    Ok(())
}

// -----------
// | Helpers |
// -----------

/// Logged UUPS deployment options that leave existing deployments untouched
fn uups_deploy(deployer: Address, init_args: Vec<DynSolValue>) -> DeployOptions {
    DeployOptions::new(deployer)
        .with_proxy(ProxyOptions::uups().with_init(INITIALIZER, init_args))
        .skip_if_already_deployed()
        .logged()
}

/// Check that the staking manager was initialized with the expected roles
async fn assert_staking_manager_roles<D: Deployments>(
    env: &D,
    owner: Address,
    staker: Address,
) -> Result<(), ScriptError> {
    let configured_staker = env.read_address(STAKING_MANAGER, "staker").await?;
    if configured_staker != staker {
        return Err(ScriptError::DeploymentAssertion(format!(
            "StakingManager staker not set correctly: expected {:#x}, found {:#x}",
            staker, configured_staker
        )));
    }

    let configured_owner = env.read_address(STAKING_MANAGER, "owner").await?;
    if configured_owner != owner {
        return Err(ScriptError::DeploymentAssertion(format!(
            "StakingManager owner not set correctly: expected {:#x}, found {:#x}",
            owner, configured_owner
        )));
    }

    Ok(())
}

/// Deploy a yield strategy managed by the staking manager, with auto-staking disabled
async fn deploy_strategy<D: Deployments>(
    env: &mut D,
    strategy: &str,
    deployer: Address,
    owner: Address,
    staking_manager: Address,
) -> Result<(), ScriptError> {
    env.deploy(
        strategy,
        uups_deploy(deployer, vec![address(owner), address(staking_manager)]),
    )
    .await?;

    env.execute(
        strategy,
        ExecuteOptions::logged(owner),
        "setAutoStake",
        &[DynSolValue::Bool(false)],
    )
    .await?;

    Ok(())
}

/// Register a strategy with the staking manager for `asset` and make it the active one
async fn activate_strategy<D: Deployments>(
    env: &mut D,
    strategy: &str,
    owner: Address,
    asset: Address,
) -> Result<(), ScriptError> {
    let strategy_address = env.get(strategy)?.address;
    let as_owner = ExecuteOptions::logged(owner);

    env.execute(
        STAKING_MANAGER,
        as_owner.clone(),
        "addStrategy",
        &[address(asset), address(strategy_address)],
    )
    .await?;
    env.execute(
        STAKING_MANAGER,
        as_owner,
        "setActiveStrategy",
        &[
            address(asset),
            DynSolValue::Uint(U256::from(ACTIVE_STRATEGY_INDEX), 256),
        ],
    )
    .await?;

    Ok(())
}
