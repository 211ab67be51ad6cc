//! Definitions of CLI arguments and commands for the deployment playbooks

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy, show, verify},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIG_PATH, DEFAULT_DEPLOYMENTS_DIR,
        ETHERSCAN_API_KEY_ENV_VAR,
    },
    errors::ScriptError,
    types::Network,
};

/// Runs the Edgeless deployment playbooks against a network
#[derive(Parser)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub globals: GlobalArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// The network to target
    #[arg(short, long)]
    pub network: Network,

    /// Path to the network configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Root directory of the deployment ledger
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// Directory searched for compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Network RPC URL, overrides the one in the configuration file
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Private keys of the accounts to sign with, the first being the default
    #[arg(
        short,
        long = "pkey",
        env = "PKEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub pkeys: Vec<String>,

    /// Block explorer API key used for source verification
    #[arg(long, env = ETHERSCAN_API_KEY_ENV_VAR, hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Foundry project root used for source verification, overrides the
    /// one in the configuration file
    #[arg(long)]
    pub contracts_dir: Option<PathBuf>,
}

/// The commands the CLI supports
#[derive(Subcommand)]
pub enum Command {
    /// Run the network's playbooks
    Deploy(DeployArgs),
    /// Verify every contract in the network's ledger on the block explorer
    Verify,
    /// List the network's ledger
    Show,
}

impl Command {
    /// Run the command
    pub async fn run(self, globals: &GlobalArgs) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, globals).await,
            Command::Verify => verify(globals).await,
            Command::Show => show(globals),
        }
    }
}

/// Run the network's playbooks
#[derive(Args, Clone, Debug)]
pub struct DeployArgs {
    /// Only run playbooks carrying one of these tags
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Verify the deployed contracts once the playbooks complete
    #[arg(long)]
    pub verify: bool,

    /// Run playbooks even if they already completed on the network
    #[arg(long)]
    pub rerun: bool,
}
