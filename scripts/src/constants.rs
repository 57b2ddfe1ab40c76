//! Constants used in the deploy scripts

use alloy_primitives::{b256, B256};

/// The Solidity compiler version the contracts are built with
pub const SOLIDITY_VERSION: &str = "0.8.2";

/// The name of the contract deployed behind the proxy
pub const DEFAULT_CONTRACT_NAME: &str = "BankingNode";

/// The name of the contract the proxy is upgraded to
pub const DEFAULT_UPGRADE_CONTRACT_NAME: &str = "BankingNodeV2";

/// The name of the proxy contract artifact.
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The initializer invoked on the proxy right after deployment
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The storage slot containing the implementation address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The number of confirmations to wait for each transaction
pub const NUM_TX_CONFIRMATIONS: u64 = 1;

/// The default path of the deployments manifest
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default directory holding compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The extension of a Solidity source file, used as the artifact directory suffix
pub const SOLIDITY_EXTENSION: &str = ".sol";

/// The marker the compiler leaves in bytecode for unlinked libraries
pub const UNLINKED_LIBRARY_MARKER: &str = "__";

/// The placeholder proxy address the legacy upgrade script shipped with
pub const PLACEHOLDER_ADDRESS: &str = "-";

/// The RPC URL of a node running on the local machine
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545/";

/// The RPC URL used for Rinkeby when `RINKEBY_RPC_URL` is unset
pub const DEFAULT_RINKEBY_RPC_URL: &str = "https://rinkeby.infura.io/v3/";

/// The mnemonic the development nodes seed their accounts from
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

// -------------------------
// | Environment Variables |
// -------------------------

/// The environment variable selecting the network
pub const NETWORK_ENV_VAR: &str = "NETWORK";

/// The environment variable holding the Rinkeby RPC URL
pub const RINKEBY_RPC_URL_ENV_VAR: &str = "RINKEBY_RPC_URL";

/// The environment variable holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The environment variable holding the deployer's mnemonic
pub const MNEMONIC_ENV_VAR: &str = "MNEMONIC";

/// The environment variable holding the Etherscan API key
pub const ETHERSCAN_API_KEY_ENV_VAR: &str = "ETHERSCAN_API_KEY";
