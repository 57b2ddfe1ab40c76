//! Implementations of the various deploy scripts

use std::path::Path;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use tracing::{info, warn};

use crate::{
    artifacts::ContractFactory,
    cli::{AccountsArgs, DeployProxyArgs, UpgradeArgs},
    config::NetworkConfig,
    constants::{PROXY_ADMIN_STORAGE_SLOT, PROXY_IMPLEMENTATION_STORAGE_SLOT},
    deployments::{DeploymentsManifest, ProxyDeployment},
    errors::ScriptError,
    solidity::ProxyAdminContract,
    types::Network,
    utils::{
        deploy_contract, ensure_has_code, ensure_proxy_address, parse_address,
        parse_proxy_address, read_address_slot, setup_client, Client,
    },
};

/// Deploy an implementation contract behind a fresh `TransparentUpgradeableProxy`,
/// calling its initializer through the proxy in the same transaction.
pub async fn deploy_proxy(
    args: DeployProxyArgs,
    config: &NetworkConfig,
    artifacts_dir: &Path,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let implementation_factory = ContractFactory::load(artifacts_dir, &args.contract)?;
    let proxy_factory = ContractFactory::load(artifacts_dir, &args.proxy_contract)?;
    implementation_factory.check_compiler_version(config.solidity_version);

    let initializer_calldata = if args.no_initializer {
        Bytes::new()
    } else {
        implementation_factory.encode_call(&args.initializer, &args.init_args)?
    };
    let owner = args.owner.as_deref().map(parse_address).transpose()?;

    let name = args.name.unwrap_or_else(|| args.contract.clone());
    let network = config.network.name();
    let mut manifest = if config.save_deployments {
        DeploymentsManifest::read(deployments_path)?
    } else {
        DeploymentsManifest::default()
    };

    let client = setup_client(config).await?;
    manifest.ensure_chain(network, client.chain_id())?;
    let owner = owner.unwrap_or(client.sender());

    info!("Deploying {} implementation...", implementation_factory.name);
    let implementation = deploy_contract(&client, implementation_factory.deploy_code(&[])).await?;
    info!("Deployed {} implementation at {implementation:#x}", implementation_factory.name);

    info!("Deploying {}, which creates its ProxyAdmin...", proxy_factory.name);
    let constructor_args = (implementation, owner, initializer_calldata).abi_encode_params();
    let proxy = deploy_contract(&client, proxy_factory.deploy_code(&constructor_args)).await?;

    // This is the recommended way to get the proxy admin address:
    // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    let proxy_admin = read_address_slot(&client, proxy, PROXY_ADMIN_STORAGE_SLOT).await?;
    if proxy_admin.is_zero() {
        return Err(ScriptError::NotAProxy(format!(
            "{} at {proxy:#x} has no EIP-1967 admin",
            proxy_factory.name
        )));
    }

    let deployment = ProxyDeployment {
        proxy,
        proxy_admin,
        implementation,
        contract: args.contract,
        previous_implementations: vec![],
    };
    println!("{}", deployment_report(&name, &deployment));

    if config.save_deployments {
        if let Ok(replaced) = manifest.proxy(network, &name) {
            warn!("Replacing the record of {name} at {:#x}", replaced.proxy);
        }
        manifest.record_proxy(network, client.chain_id(), &name, deployment)?;
        manifest.write(deployments_path)?;
        info!("Recorded {name} in {}", deployments_path.display());
    }

    Ok(())
}

/// Upgrade a previously deployed proxy to a new implementation contract
pub async fn upgrade(
    args: UpgradeArgs,
    config: &NetworkConfig,
    artifacts_dir: &Path,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    // Resolve everything that can fail locally before touching the network
    let network = config.network.name();
    let mut manifest = match &args.proxy {
        Some(_) if !config.save_deployments => DeploymentsManifest::default(),
        _ => DeploymentsManifest::read(deployments_path)?,
    };
    let proxy = match args.proxy.as_deref() {
        Some(raw) => {
            let proxy = parse_proxy_address(raw)?;
            manifest.ensure_unrecorded_or(network, &args.name, proxy)?;
            proxy
        }
        None => ensure_proxy_address(manifest.proxy(network, &args.name)?.proxy)?,
    };

    let factory = ContractFactory::load(artifacts_dir, &args.contract)?;
    factory.check_compiler_version(config.solidity_version);
    let calldata = match &args.call {
        Some(function) => factory.encode_call(function, &args.call_args)?,
        None if !args.call_args.is_empty() => {
            return Err(ScriptError::CalldataConstruction(
                "call arguments given without a function to call".to_string(),
            ))
        }
        None => Bytes::new(),
    };

    let client = setup_client(config).await?;
    manifest.ensure_chain(network, client.chain_id())?;

    let proxy_admin = check_upgrade_authority(&client, proxy).await?;
    let previous = read_address_slot(&client, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;

    info!("Deploying {} implementation...", factory.name);
    let implementation = deploy_contract(&client, factory.deploy_code(&[])).await?;
    info!("Deployed {} implementation at {implementation:#x}", factory.name);

    info!("Upgrading proxy {proxy:#x} from {previous:#x} to {implementation:#x}...");
    let admin = ProxyAdminContract::new(proxy_admin, client.provider());
    let receipt = admin
        .upgradeAndCall(proxy, implementation, calldata)
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "upgrade transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }

    let current = read_address_slot(&client, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;
    if current != implementation {
        return Err(ScriptError::UpgradeVerification(format!(
            "proxy {proxy:#x} points at {current:#x}, expected {implementation:#x}"
        )));
    }

    println!("Upgraded proxy {proxy:#x} to {} at {implementation:#x}", factory.name);

    if config.save_deployments {
        if manifest.proxy(network, &args.name).is_ok() {
            manifest.record_upgrade(network, &args.name, &factory.name, implementation)?;
        } else {
            // An explicitly addressed proxy the manifest did not know about
            let deployment = ProxyDeployment {
                proxy,
                proxy_admin,
                implementation,
                contract: factory.name.clone(),
                previous_implementations: vec![previous],
            };
            manifest.record_proxy(network, client.chain_id(), &args.name, deployment)?;
        }
        manifest.write(deployments_path)?;
        info!("Recorded upgrade of {} in {}", args.name, deployments_path.display());
    }

    Ok(())
}

/// Check that `proxy` is an EIP-1967 proxy whose admin the deployer owns,
/// returning the admin's address
async fn check_upgrade_authority(client: &Client, proxy: Address) -> Result<Address, ScriptError> {
    ensure_has_code(client, proxy).await?;

    let proxy_admin = read_address_slot(client, proxy, PROXY_ADMIN_STORAGE_SLOT).await?;
    if proxy_admin.is_zero() {
        return Err(ScriptError::NotAProxy(format!("{proxy:#x} has no EIP-1967 admin")));
    }

    let admin = ProxyAdminContract::new(proxy_admin, client.provider());
    let owner = admin
        .owner()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        ._0;
    if owner != client.sender() {
        return Err(ScriptError::Unauthorized(format!(
            "ProxyAdmin {proxy_admin:#x} is owned by {owner:#x}, not the deployer {:#x}",
            client.sender()
        )));
    }

    Ok(proxy_admin)
}

/// Print the addresses of the configured accounts
pub fn accounts(args: AccountsArgs, config: &NetworkConfig) -> Result<(), ScriptError> {
    let signers = config.signers(args.count)?;
    if (signers.len() as u32) < args.count {
        warn!("{} credentials only provide {} account(s)", config.credentials.describe(), signers.len());
    }

    for signer in signers {
        println!("{:#x}", signer.address());
    }

    Ok(())
}

/// Print the network table, resolved against the environment
pub fn networks(selected: Network, resolve: impl Fn(Network) -> NetworkConfig) {
    for network in Network::ALL {
        println!("{}", network_line(&resolve(network), network == selected));
    }
}

/// One row of the network table, with credentials redacted
fn network_line(config: &NetworkConfig, selected: bool) -> String {
    format!(
        "{} {:<8} rpc={} accounts={} etherscan={} save_deployments={}",
        if selected { "*" } else { " " },
        config.network.name(),
        config.rpc,
        config.credentials.describe(),
        if config.etherscan_api_key.is_some() { "set" } else { "unset" },
        config.save_deployments,
    )
}

/// The lines printed after a successful proxy deployment
pub fn deployment_report(name: &str, deployment: &ProxyDeployment) -> String {
    format!(
        "Proxy of {name} deployed to: {:#x}\nProxyAdmin deployed to: {:#x}\n{} implementation deployed to: {:#x}",
        deployment.proxy, deployment.proxy_admin, deployment.contract, deployment.implementation
    )
}
