//! The deployments manifest, which records where each proxy lives on each network.
//!
//! The manifest is a JSON file of the form
//!
//! ```json
//! {
//!     "rinkeby": {
//!         "chain_id": 4,
//!         "proxies": {
//!             "BankingNode": {
//!                 "proxy": "0x...",
//!                 "proxy_admin": "0x...",
//!                 "implementation": "0x...",
//!                 "contract": "BankingNodeV2",
//!                 "previous_implementations": ["0x..."]
//!             }
//!         }
//!     }
//! }
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ScriptError;

/// A deployed upgradeable proxy and the contracts around it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyDeployment {
    /// The proxy address, which callers interact with
    pub proxy: Address,
    /// The `ProxyAdmin` allowed to upgrade the proxy
    pub proxy_admin: Address,
    /// The implementation the proxy currently delegates to
    pub implementation: Address,
    /// The name of the implementation contract
    pub contract: String,
    /// Implementations the proxy delegated to before, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_implementations: Vec<Address>,
}

/// All deployments recorded for one network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDeployments {
    /// The chain ID the deployments were made on
    pub chain_id: u64,
    /// Proxies keyed by deployment name
    #[serde(default)]
    pub proxies: BTreeMap<String, ProxyDeployment>,
}

/// The contents of the deployments manifest
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentsManifest {
    /// Deployments keyed by network name
    networks: BTreeMap<String, NetworkDeployments>,
}

impl DeploymentsManifest {
    /// Read the manifest at `path`, treating a missing file as an empty manifest
    pub fn read(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))
    }

    /// Write the manifest to `path`, creating parent directories as needed
    pub fn write(&self, path: &Path) -> Result<(), ScriptError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, contents + "\n").map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }

    /// The deployments recorded for `network`, if any
    pub fn network(&self, network: &str) -> Option<&NetworkDeployments> {
        self.networks.get(network)
    }

    /// Look up the proxy deployed under `name` on `network`
    pub fn proxy(&self, network: &str, name: &str) -> Result<&ProxyDeployment, ScriptError> {
        self.network(network)
            .ok_or_else(|| {
                ScriptError::ReadDeployments(format!("no deployments recorded for {network}"))
            })?
            .proxies
            .get(name)
            .ok_or_else(|| {
                ScriptError::ReadDeployments(format!("no {name} proxy recorded for {network}"))
            })
    }

    /// Ensure the deployments recorded for `network` were made on chain `chain_id`
    pub fn ensure_chain(&self, network: &str, chain_id: u64) -> Result<(), ScriptError> {
        match self.network(network) {
            Some(recorded) if recorded.chain_id != chain_id => {
                Err(ScriptError::ReadDeployments(format!(
                    "deployments for {network} were recorded on chain {}, but the node is chain {chain_id}",
                    recorded.chain_id
                )))
            }
            _ => Ok(()),
        }
    }

    /// Ensure `name` on `network` is either unrecorded or already records `proxy`
    pub fn ensure_unrecorded_or(
        &self,
        network: &str,
        name: &str,
        proxy: Address,
    ) -> Result<(), ScriptError> {
        match self.network(network).and_then(|n| n.proxies.get(name)) {
            Some(recorded) if recorded.proxy != proxy => Err(ScriptError::ReadDeployments(format!(
                "{name} is recorded at {:#x} on {network}, use a different --name for {proxy:#x}",
                recorded.proxy
            ))),
            _ => Ok(()),
        }
    }

    /// Record a freshly deployed proxy, replacing any previous record under `name`
    pub fn record_proxy(
        &mut self,
        network: &str,
        chain_id: u64,
        name: &str,
        deployment: ProxyDeployment,
    ) -> Result<(), ScriptError> {
        if let Some(recorded) = self.network(network).filter(|n| n.chain_id != chain_id) {
            return Err(ScriptError::WriteDeployments(format!(
                "{network} records chain {}, refusing to record {name} from chain {chain_id}",
                recorded.chain_id
            )));
        }

        self.networks
            .entry(network.to_string())
            .or_insert_with(|| NetworkDeployments { chain_id, proxies: BTreeMap::new() })
            .proxies
            .insert(name.to_string(), deployment);
        Ok(())
    }

    /// Point the proxy recorded under `name` at a new implementation
    pub fn record_upgrade(
        &mut self,
        network: &str,
        name: &str,
        contract: &str,
        implementation: Address,
    ) -> Result<(), ScriptError> {
        let deployment = self
            .networks
            .get_mut(network)
            .and_then(|n| n.proxies.get_mut(name))
            .ok_or_else(|| {
                ScriptError::WriteDeployments(format!("no {name} proxy recorded for {network}"))
            })?;

        if deployment.implementation != implementation {
            deployment.previous_implementations.push(deployment.implementation);
            deployment.implementation = implementation;
        }
        deployment.contract = contract.to_string();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use tempfile::TempDir;

    use super::*;

    /// The recorded proxy
    const PROXY: Address = address!("1000000000000000000000000000000000000001");
    /// The recorded proxy's admin
    const ADMIN: Address = address!("2000000000000000000000000000000000000002");
    /// The implementation the proxy was deployed with
    const IMPL_V1: Address = address!("3000000000000000000000000000000000000003");
    /// The implementation the proxy is upgraded to
    const IMPL_V2: Address = address!("4000000000000000000000000000000000000004");

    /// A proxy deployment pointing at the first implementation
    fn deployment() -> ProxyDeployment {
        ProxyDeployment {
            proxy: PROXY,
            proxy_admin: ADMIN,
            implementation: IMPL_V1,
            contract: "BankingNode".to_string(),
            previous_implementations: vec![],
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let manifest = DeploymentsManifest::read(&dir.path().join("deployments.json")).unwrap();

        assert_eq!(manifest, DeploymentsManifest::default());
        assert!(manifest.network("rinkeby").is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deployments.json");

        let mut manifest = DeploymentsManifest::default();
        manifest.record_proxy("rinkeby", 4, "BankingNode", deployment()).unwrap();
        manifest.write(&path).unwrap();

        let read = DeploymentsManifest::read(&path).unwrap();
        assert_eq!(read, manifest);
        assert_eq!(read.network("rinkeby").unwrap().chain_id, 4);
        assert_eq!(read.proxy("rinkeby", "BankingNode").unwrap().proxy, PROXY);

        // No history is written until an upgrade happens
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("previous_implementations"));
    }

    #[test]
    fn test_lookup_errors() {
        let mut manifest = DeploymentsManifest::default();
        let err = manifest.proxy("rinkeby", "BankingNode").unwrap_err();
        assert!(err.to_string().contains("no deployments recorded for rinkeby"));

        manifest.record_proxy("rinkeby", 4, "Other", deployment()).unwrap();
        let err = manifest.proxy("rinkeby", "BankingNode").unwrap_err();
        assert!(err.to_string().contains("no BankingNode proxy recorded"));
    }

    #[test]
    fn test_record_upgrade_keeps_history() {
        let mut manifest = DeploymentsManifest::default();
        manifest.record_proxy("local", 31337, "BankingNode", deployment()).unwrap();
        manifest.record_upgrade("local", "BankingNode", "BankingNodeV2", IMPL_V2).unwrap();

        let upgraded = manifest.proxy("local", "BankingNode").unwrap();
        assert_eq!(upgraded.implementation, IMPL_V2);
        assert_eq!(upgraded.contract, "BankingNodeV2");
        assert_eq!(upgraded.previous_implementations, vec![IMPL_V1]);
        assert_eq!(upgraded.proxy, PROXY);

        // Re-recording the same implementation does not grow the history
        manifest.record_upgrade("local", "BankingNode", "BankingNodeV2", IMPL_V2).unwrap();
        assert_eq!(manifest.proxy("local", "BankingNode").unwrap().previous_implementations.len(), 1);
    }

    #[test]
    fn test_record_upgrade_requires_deployment() {
        let mut manifest = DeploymentsManifest::default();
        let err = manifest.record_upgrade("local", "BankingNode", "BankingNodeV2", IMPL_V2);
        assert!(matches!(err, Err(ScriptError::WriteDeployments(_))));
    }

    #[test]
    fn test_other_chain_keeps_records() {
        let mut manifest = DeploymentsManifest::default();
        manifest.record_proxy("rinkeby", 4, "BankingNode", deployment()).unwrap();

        let err = manifest.record_proxy("rinkeby", 1337, "Other", deployment()).unwrap_err();
        assert!(matches!(err, ScriptError::WriteDeployments(_)));
        assert!(err.to_string().contains("chain 4"));

        let rinkeby = manifest.network("rinkeby").unwrap();
        assert_eq!(rinkeby.chain_id, 4);
        assert!(rinkeby.proxies.contains_key("BankingNode"));
        assert!(!rinkeby.proxies.contains_key("Other"));

        assert!(manifest.ensure_chain("rinkeby", 4).is_ok());
        assert!(manifest.ensure_chain("rinkeby", 1337).is_err());
        // Nothing recorded yet, so any chain is fine
        assert!(manifest.ensure_chain("local", 1337).is_ok());
    }

    #[test]
    fn test_name_recorded_at_other_proxy() {
        let mut manifest = DeploymentsManifest::default();
        assert!(manifest.ensure_unrecorded_or("local", "BankingNode", PROXY).is_ok());

        manifest.record_proxy("local", 31337, "BankingNode", deployment()).unwrap();
        assert!(manifest.ensure_unrecorded_or("local", "BankingNode", PROXY).is_ok());
        assert!(manifest.ensure_unrecorded_or("local", "Treasury", ADMIN).is_ok());

        let err = manifest.ensure_unrecorded_or("local", "BankingNode", ADMIN).unwrap_err();
        assert!(err.to_string().contains("use a different --name"));
        assert_eq!(manifest.proxy("local", "BankingNode").unwrap().proxy, PROXY);
    }

    #[test]
    fn test_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deployments.json");
        fs::write(&path, r#"{"rinkeby": {"chain_id": 4, "proxies": {"BankingNode": {"proxy": "-"}}}}"#)
            .unwrap();

        let err = DeploymentsManifest::read(&path).unwrap_err();
        assert!(matches!(err, ScriptError::ReadDeployments(_)));
    }
}
