//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{accounts, deploy_proxy, networks, upgrade},
    config::{ConfigOverrides, NetworkConfig},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONTRACT_NAME, DEFAULT_DEPLOYMENTS_PATH,
        DEFAULT_INITIALIZER, DEFAULT_UPGRADE_CONTRACT_NAME, NETWORK_ENV_VAR, PROXY_CONTRACT_NAME,
    },
    errors::ScriptError,
    types::Network,
};

/// Deploy and upgrade the BankingNode upgradeable proxy.
///
/// Network credentials are read from `PRIVATE_KEY` or `MNEMONIC`, and the
/// Rinkeby endpoint from `RINKEBY_RPC_URL`.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The network to run against
    #[arg(short, long, env = NETWORK_ENV_VAR, default_value_t = Network::default(), global = true)]
    pub network: Network,

    /// Network RPC URL, overriding the network's default
    #[arg(short, long, global = true)]
    pub rpc_url: Option<String>,

    /// Private key of the deployer, overriding `PRIVATE_KEY`
    #[arg(short, long, global = true)]
    pub priv_key: Option<String>,

    /// Path to the deployments manifest
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH, global = true)]
    pub deployments_path: PathBuf,

    /// Directory containing the compiled contract artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR, global = true)]
    pub artifacts_dir: PathBuf,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The configuration overrides given on the command line
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides { rpc_url: self.rpc_url.clone(), priv_key: self.priv_key.clone() }
    }

    /// Resolve the configuration and run the selected command
    pub async fn run(self) -> Result<(), ScriptError> {
        let overrides = self.overrides();
        let config = NetworkConfig::from_env(self.network, overrides.clone());

        match self.command {
            Command::DeployProxy(args) => {
                deploy_proxy(args, &config, &self.artifacts_dir, &self.deployments_path).await
            }
            Command::Upgrade(args) => {
                upgrade(args, &config, &self.artifacts_dir, &self.deployments_path).await
            }
            Command::Accounts(args) => accounts(args, &config),
            Command::Networks => {
                // Overrides only apply to the network they were given for
                networks(self.network, |network| {
                    let overrides = if network == self.network {
                        overrides.clone()
                    } else {
                        ConfigOverrides::default()
                    };
                    NetworkConfig::from_env(network, overrides)
                });
                Ok(())
            }
        }
    }
}

/// The scripts that can be run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract behind a new upgradeable proxy
    DeployProxy(DeployProxyArgs),
    /// Upgrade a deployed proxy to a new implementation
    Upgrade(UpgradeArgs),
    /// Print the deployer accounts for the selected network
    Accounts(AccountsArgs),
    /// List the known networks and how each one is configured
    Networks,
}

/// Deploy a contract behind an upgradeable proxy.
///
/// Concretely, this is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract.
///
/// Calls made directly to the `TransparentUpgradeableProxy` contract will be forwarded to the implementation contract.
/// Upgrade calls can only be made to the `TransparentUpgradeableProxy` through the `ProxyAdmin`.
#[derive(Args)]
pub struct DeployProxyArgs {
    /// Name of the implementation contract
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Name to record the deployment under, defaults to the contract name
    #[arg(long)]
    pub name: Option<String>,

    /// Initializer invoked through the proxy once it is deployed
    #[arg(long, default_value = DEFAULT_INITIALIZER)]
    pub initializer: String,

    /// Argument to the initializer, repeated once per parameter
    #[arg(long = "init-arg", allow_hyphen_values = true)]
    pub init_args: Vec<String>,

    /// Deploy without invoking any initializer
    #[arg(long, conflicts_with_all = ["initializer", "init_args"])]
    pub no_initializer: bool,

    /// Owner of the proxy admin contract, defaults to the deployer
    #[arg(long)]
    pub owner: Option<String>,

    /// Name of the proxy contract artifact
    #[arg(long, default_value = PROXY_CONTRACT_NAME)]
    pub proxy_contract: String,
}

/// Upgrade a deployed proxy to a new implementation contract
#[derive(Args)]
pub struct UpgradeArgs {
    /// Name of the new implementation contract
    #[arg(long, default_value = DEFAULT_UPGRADE_CONTRACT_NAME)]
    pub contract: String,

    /// Name the proxy is recorded under in the deployments manifest
    #[arg(long, default_value = DEFAULT_CONTRACT_NAME)]
    pub name: String,

    /// Address of the proxy contract, instead of reading it from the manifest
    #[arg(long, allow_hyphen_values = true)]
    pub proxy: Option<String>,

    /// Function of the new implementation to call as part of the upgrade
    #[arg(long)]
    pub call: Option<String>,

    /// Argument to the upgrade call, repeated once per parameter
    #[arg(long = "call-arg", allow_hyphen_values = true)]
    pub call_args: Vec<String>,
}

/// Print the deployer accounts for the selected network
#[derive(Args)]
pub struct AccountsArgs {
    /// Number of accounts to derive from a mnemonic
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,
}
