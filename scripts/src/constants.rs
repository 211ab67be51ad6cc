//! Constants used in the deployment playbooks

/// The number of confirmations to wait for when the network config does not specify one
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// The default path of the network configuration file
pub const DEFAULT_CONFIG_PATH: &str = "deploy.config.json";

/// The default root directory of the deployment ledger
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default directory in which compiled contract artifacts are searched for
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The file, within a network's ledger directory, recording the chain ID
pub const CHAIN_ID_FILE: &str = ".chainId";

/// The file, within a network's ledger directory, recording completed playbooks
pub const MIGRATIONS_FILE: &str = ".migrations.json";

/// The extension of ledger records and compilation artifacts
pub const JSON_EXTENSION: &str = "json";

/// The suffix of Hardhat debug artifacts, which are never contract artifacts
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// The suffix appended to a proxied contract's name for its implementation record
pub const IMPLEMENTATION_SUFFIX: &str = "_Implementation";

/// The suffix appended to a proxied contract's name for its proxy record
pub const PROXY_SUFFIX: &str = "_Proxy";

/// The artifact name of the ERC-1967 proxy used for UUPS deployments
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Proxy.sol
pub const ERC1967_PROXY_ARTIFACT: &str = "ERC1967Proxy";

/// The artifact name of the transparent upgradeable proxy
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const TRANSPARENT_PROXY_ARTIFACT: &str = "TransparentUpgradeableProxy";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The interval at which transaction receipts are polled for, in milliseconds
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

/// How long to wait for a transaction to be mined and confirmed, in seconds
pub const RECEIPT_TIMEOUT_SECS: u64 = 600;

/// The name of the environment variable holding the block explorer API key
pub const ETHERSCAN_API_KEY_ENV_VAR: &str = "ETHERSCAN_API_KEY";

/// The name of the Foundry command used for source verification
pub const FORGE_COMMAND: &str = "forge";

/// The name of the source verification subcommand
pub const VERIFY_CONTRACT_COMMAND: &str = "verify-contract";

/// The name of the initializer run through a freshly deployed proxy
pub const INITIALIZER: &str = "initialize";

// ----------------------
// | Contract Names     |
// ----------------------

/// The deposit vault
pub const EDGELESS_DEPOSIT: &str = "EdgelessDeposit";

/// The staking manager
pub const STAKING_MANAGER: &str = "StakingManager";

/// The ETH yield strategy
pub const ETH_STRATEGY: &str = "EthStrategy";

/// The DAI yield strategy
pub const DAI_STRATEGY: &str = "DaiStrategy";

/// The artifact shared by the wrapped tokens the deposit vault creates
pub const WRAPPED_TOKEN_ARTIFACT: &str = "WrappedToken";

/// The ledger alias of the wrapped ETH token
pub const WRAPPED_ETH_ALIAS: &str = "Edgeless Wrapped ETH";

/// The ledger alias of the wrapped USD token
pub const WRAPPED_USD_ALIAS: &str = "Edgeless Wrapped USD";

// ----------------------
// | Named Accounts     |
// ----------------------

/// The account that sends deployment transactions
pub const DEPLOYER: &str = "deployer";

/// The account that owns the deployed contracts
pub const OWNER: &str = "owner";

/// The account permitted to stake on behalf of the protocol
pub const STAKER: &str = "staker";

/// The L1 standard bridge the deposit vault bridges through
pub const L1_STANDARD_BRIDGE: &str = "l1StandardBridge";

/// The L2 wrapped USD token address
pub const L2_USD: &str = "l2USD";
