//! Goerli playbooks

use crate::{
    constants::{DEPLOYER, EDGELESS_DEPOSIT, INITIALIZER, L1_STANDARD_BRIDGE, OWNER, STAKER},
    env::Deployments,
    errors::ScriptError,
    types::{DeployOptions, ProxyOptions},
};

use super::{address, save_wrapped_tokens};

/// The id of [`deploy`]
pub const DEPLOY_ID: &str = "001_deploy";

/// Deploy the deposit vault behind a UUPS proxy, register its wrapped
/// tokens, and verify the deployed sources
pub async fn deploy<D: Deployments>(env: &mut D) -> Result<(), ScriptError> {
    if env.get_or_null(EDGELESS_DEPOSIT)?.is_some() {
        env.log("EdgelessDeposit already deployed, skipping...");
        return Ok(());
    }

    let deployer = env.account(DEPLOYER)?;
    let owner = env.account(OWNER)?;
    let staker = env.account(STAKER)?;
    let l1_standard_bridge = env.account(L1_STANDARD_BRIDGE)?;

    env.deploy(
        EDGELESS_DEPOSIT,
        DeployOptions::new(deployer)
            .with_proxy(ProxyOptions::uups().with_init(
                INITIALIZER,
                vec![address(owner), address(staker), address(l1_standard_bridge)],
            ))
            .skip_if_already_deployed(),
    )
    .await?;

    save_wrapped_tokens(env).await?;

    env.verify().await
}
