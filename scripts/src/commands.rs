//! Implementations of the CLI commands

use std::path::PathBuf;

use tracing::info;

use crate::{
    artifacts::ArtifactStore,
    cli::{DeployArgs, GlobalArgs},
    config::DeployConfig,
    env::{ChainDeployments, Deployments},
    errors::ScriptError,
    ledger::DeploymentLedger,
    playbooks::{run_playbooks, RunOptions},
    utils::setup_client,
    verify::Verifier,
};

/// Run the network's playbooks, optionally verifying the results
pub async fn deploy(args: DeployArgs, globals: &GlobalArgs) -> Result<(), ScriptError> {
    let (mut env, ledger) = connect(globals).await?;

    let options = RunOptions {
        tags: args.tags,
        rerun: args.rerun,
    };
    let ran = run_playbooks(&mut env, &ledger, globals.network, &options).await?;
    info!("ran {} playbook(s) on {}", ran.len(), globals.network);

    if args.verify {
        env.verify().await?;
    }

    Ok(())
}

/// Verify every contract in the network's ledger
pub async fn verify(globals: &GlobalArgs) -> Result<(), ScriptError> {
    let (env, _) = connect(globals).await?;
    env.verify().await
}

/// Print the network's ledger
pub fn show(globals: &GlobalArgs) -> Result<(), ScriptError> {
    let ledger = open_ledger(globals);
    let records = ledger.all()?;
    if records.is_empty() {
        info!("no deployments recorded in {}", ledger.dir().display());
        return Ok(());
    }

    for (name, deployment) in records {
        match deployment.implementation {
            Some(implementation) => println!(
                "{}: {:#x} (implementation {:#x})",
                name, deployment.address, implementation
            ),
            None => println!("{}: {:#x}", name, deployment.address),
        }
    }

    Ok(())
}

/// Open the ledger of the targeted network
fn open_ledger(globals: &GlobalArgs) -> DeploymentLedger {
    DeploymentLedger::open(&globals.deployments_dir, &globals.network.to_string())
}

/// Connect to the targeted network, returning the deployment environment
/// along with a handle on its ledger
async fn connect(
    globals: &GlobalArgs,
) -> Result<(ChainDeployments, DeploymentLedger), ScriptError> {
    let network = globals.network.to_string();
    let config = DeployConfig::load(&globals.config)?;
    let network_config = config.network(&network)?;

    let rpc_url = globals
        .rpc_url
        .clone()
        .or_else(|| network_config.rpc_url.clone())
        .ok_or_else(|| ScriptError::Config(format!("no RPC URL configured for {}", network)))?;
    let (provider, signers) = setup_client(&globals.pkeys, &rpc_url)?;

    let contracts_dir = globals
        .contracts_dir
        .clone()
        .or_else(|| network_config.contracts_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let verifier = Verifier::new(globals.etherscan_api_key.clone(), contracts_dir);

    let ledger = open_ledger(globals);
    let env = ChainDeployments::connect(
        provider,
        signers,
        network_config,
        ledger.clone(),
        ArtifactStore::new(&globals.artifacts_dir),
        verifier,
    )
    .await?;

    Ok((env, ledger))
}
