//! Resolution of the network, account, and compiler settings used by the scripts.
//!
//! Settings come from three places, in decreasing order of precedence: CLI
//! overrides, environment variables, and the per-network defaults below.
//! Empty environment variables are treated as unset.

use std::{
    env,
    fmt::{self, Debug, Display},
    str::FromStr,
};

use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use tracing::warn;

use crate::{
    constants::{
        DEFAULT_RINKEBY_RPC_URL, DEV_MNEMONIC, ETHERSCAN_API_KEY_ENV_VAR, LOCAL_RPC_URL,
        MNEMONIC_ENV_VAR, PRIVATE_KEY_ENV_VAR, RINKEBY_RPC_URL_ENV_VAR, SOLIDITY_VERSION,
    },
    errors::ScriptError,
    types::Network,
};

/// Where the scripts send their RPC requests
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcEndpoint {
    /// Spawn a development node for the lifetime of the command
    DevNode,
    /// Connect to the node at the given URL
    Url(String),
}

impl Display for RpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcEndpoint::DevNode => write!(f, "<spawned dev node>"),
            RpcEndpoint::Url(url) => write!(f, "{}", url),
        }
    }
}

/// The source of the deployer's signing key(s)
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A single hex-encoded private key
    PrivateKey(String),
    /// A BIP-39 mnemonic, from which accounts are derived
    Mnemonic(String),
    /// The well-known mnemonic of the development nodes
    DevMnemonic,
    /// No credentials were configured
    Missing,
}

impl Credentials {
    /// A short description of the credential source, safe to print
    pub fn describe(&self) -> &'static str {
        match self {
            Credentials::PrivateKey(_) => "private key",
            Credentials::Mnemonic(_) => "mnemonic",
            Credentials::DevMnemonic => "development mnemonic",
            Credentials::Missing => "none",
        }
    }
}

// Never print key material
impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials({})", self.describe())
    }
}

/// Values given on the command line, which take precedence over the environment
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// The RPC URL to use instead of the network's default
    pub rpc_url: Option<String>,
    /// The private key to use instead of `PRIVATE_KEY`
    pub priv_key: Option<String>,
}

/// The fully resolved settings for a single script invocation
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The selected network
    pub network: Network,
    /// Where to send RPC requests
    pub rpc: RpcEndpoint,
    /// The deployer's credentials
    pub credentials: Credentials,
    /// The Etherscan API key, if any
    pub etherscan_api_key: Option<String>,
    /// Whether deployments are recorded in the manifest
    pub save_deployments: bool,
    /// The compiler version the artifacts are expected to come from
    pub solidity_version: &'static str,
}

impl NetworkConfig {
    /// Resolve the configuration for `network` from the process environment
    pub fn from_env(network: Network, overrides: ConfigOverrides) -> Self {
        Self::from_env_with(network, overrides, |key| env::var(key).ok())
    }

    /// Resolve the configuration for `network`, reading variables through `lookup`
    pub fn from_env_with<F>(network: Network, overrides: ConfigOverrides, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_empty(lookup(key));
        let rpc_url = non_empty(overrides.rpc_url);

        let rpc = match network {
            Network::Hardhat => {
                if let Some(url) = rpc_url {
                    warn!("ignoring RPC URL {url}, the hardhat network always spawns its own node");
                }
                RpcEndpoint::DevNode
            }
            Network::Local => RpcEndpoint::Url(rpc_url.unwrap_or_else(|| LOCAL_RPC_URL.to_string())),
            Network::Rinkeby => RpcEndpoint::Url(
                rpc_url
                    .or_else(|| var(RINKEBY_RPC_URL_ENV_VAR))
                    .unwrap_or_else(|| DEFAULT_RINKEBY_RPC_URL.to_string()),
            ),
        };

        let credentials = if let Some(key) =
            non_empty(overrides.priv_key).or_else(|| var(PRIVATE_KEY_ENV_VAR))
        {
            Credentials::PrivateKey(key)
        } else if let Some(phrase) = var(MNEMONIC_ENV_VAR) {
            Credentials::Mnemonic(phrase)
        } else if network.is_development() {
            Credentials::DevMnemonic
        } else {
            Credentials::Missing
        };

        Self {
            network,
            rpc,
            credentials,
            etherscan_api_key: var(ETHERSCAN_API_KEY_ENV_VAR),
            save_deployments: network.saves_deployments(),
            solidity_version: SOLIDITY_VERSION,
        }
    }

    /// The deployer's signer, i.e. the first configured account
    pub fn signer(&self) -> Result<PrivateKeySigner, ScriptError> {
        self.signers(1)?
            .into_iter()
            .next()
            .ok_or_else(|| ScriptError::Config("no signer available".to_string()))
    }

    /// Up to `count` signers derived from the configured credentials.
    ///
    /// A private key only ever yields a single signer.
    pub fn signers(&self, count: u32) -> Result<Vec<PrivateKeySigner>, ScriptError> {
        match &self.credentials {
            Credentials::PrivateKey(key) => {
                let signer = PrivateKeySigner::from_str(key.trim())
                    .map_err(|e| ScriptError::Config(format!("invalid private key: {e}")))?;
                Ok(vec![signer])
            }
            Credentials::Mnemonic(phrase) => mnemonic_signers(phrase, count),
            Credentials::DevMnemonic => mnemonic_signers(DEV_MNEMONIC, count),
            Credentials::Missing => Err(ScriptError::Config(format!(
                "no credentials for network {}, set {PRIVATE_KEY_ENV_VAR} or {MNEMONIC_ENV_VAR}",
                self.network
            ))),
        }
    }
}

/// Derive the first `count` accounts of a mnemonic along the default derivation path
fn mnemonic_signers(phrase: &str, count: u32) -> Result<Vec<PrivateKeySigner>, ScriptError> {
    (0..count)
        .map(|index| {
            MnemonicBuilder::<English>::default()
                .phrase(phrase.trim())
                .index(index)
                .map_err(|e| ScriptError::Config(format!("invalid derivation index: {e}")))?
                .build()
                .map_err(|e| ScriptError::Config(format!("invalid mnemonic: {e}")))
        })
        .collect()
}

/// Treat blank values as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
