//! Utilities for the deploy scripts.

use std::str::FromStr;

use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    node_bindings::{Anvil, AnvilInstance},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::http::reqwest::Url,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use tracing::{debug, info};

use crate::{
    config::{NetworkConfig, RpcEndpoint},
    constants::{NUM_TX_CONFIRMATIONS, PLACEHOLDER_ADDRESS},
    errors::ScriptError,
};

/// The provider type used by the scripts
pub type RpcProvider = DynProvider<Ethereum>;

/// A signing RPC client, along with the development node backing it, if one was spawned
pub struct Client {
    /// The provider, with the deployer's wallet attached
    provider: RpcProvider,
    /// The deployer's address
    sender: Address,
    /// The chain ID reported by the node
    chain_id: u64,
    /// Keeps a spawned development node alive until the client is dropped
    _dev_node: Option<AnvilInstance>,
}

impl Client {
    /// The underlying provider
    pub fn provider(&self) -> &RpcProvider {
        &self.provider
    }

    /// The address transactions are sent from
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// The chain ID of the connected network
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// Sets up the signing client for the configured network, spawning a
/// development node first if the network calls for one.
pub async fn setup_client(config: &NetworkConfig) -> Result<Client, ScriptError> {
    let signer = config.signer()?;
    let sender = signer.address();

    let (url, dev_node) = match &config.rpc {
        RpcEndpoint::DevNode => {
            info!("Spawning development node...");
            let anvil = Anvil::new()
                .try_spawn()
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
            let url = Url::parse(&anvil.endpoint())
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
            (url, Some(anvil))
        }
        RpcEndpoint::Url(url) => {
            let url = Url::parse(url)
                .map_err(|e| ScriptError::ClientInitialization(format!("{url}: {e}")))?;
            (url, None)
        }
    };

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);
    let provider = DynProvider::new(provider);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!("Connected to {} (chain {chain_id}) as {sender:#x}", config.network);

    Ok(Client { provider, sender, chain_id, _dev_node: dev_node })
}

/// Parse an address argument, rejecting the placeholder the legacy scripts shipped with
pub fn parse_address(raw: &str) -> Result<Address, ScriptError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == PLACEHOLDER_ADDRESS {
        return Err(ScriptError::InvalidAddress(format!(
            "{raw:?} is a placeholder, not a deployed address"
        )));
    }

    Address::from_str(raw).map_err(|e| ScriptError::InvalidAddress(format!("{raw:?}: {e}")))
}

/// Parse the address of a proxy to upgrade
pub fn parse_proxy_address(raw: &str) -> Result<Address, ScriptError> {
    parse_address(raw).and_then(ensure_proxy_address)
}

/// A proxy can never live at the zero address
pub fn ensure_proxy_address(address: Address) -> Result<Address, ScriptError> {
    if address.is_zero() {
        return Err(ScriptError::InvalidAddress(
            "the zero address cannot be a proxy".to_string(),
        ));
    }

    Ok(address)
}

/// Send a contract creation transaction and return the address of the new contract
pub async fn deploy_contract(client: &Client, code: Bytes) -> Result<Address, ScriptError> {
    let tx = TransactionRequest::default().with_deploy_code(code);
    let receipt = send_tx(client, tx).await.map_err(ScriptError::ContractDeployment)?;

    receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!(
            "no contract address in receipt for {:#x}",
            receipt.transaction_hash
        ))
    })
}

/// Send a transaction and wait for it to succeed
pub async fn send_tx(client: &Client, tx: TransactionRequest) -> Result<TransactionReceipt, String> {
    let receipt = client
        .provider
        .send_transaction(tx)
        .await
        .map_err(|e| e.to_string())?
        .with_required_confirmations(NUM_TX_CONFIRMATIONS)
        .get_receipt()
        .await
        .map_err(|e| e.to_string())?;

    debug!("Transaction {:#x} mined", receipt.transaction_hash);
    if !receipt.status() {
        return Err(format!("transaction {:#x} reverted", receipt.transaction_hash));
    }

    Ok(receipt)
}

/// Read an address out of a storage slot of the contract at `address`
pub async fn read_address_slot(
    client: &Client,
    address: Address,
    slot: B256,
) -> Result<Address, ScriptError> {
    let value = client
        .provider
        .get_storage_at(address, U256::from_be_bytes(slot.0))
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(address_from_slot(value))
}

/// An address is stored right-aligned in its 32-byte slot
pub fn address_from_slot(value: U256) -> Address {
    Address::from_word(B256::from(value.to_be_bytes::<32>()))
}

/// Ensure there is a contract deployed at `address`
pub async fn ensure_has_code(client: &Client, address: Address) -> Result<(), ScriptError> {
    let code = client
        .provider
        .get_code_at(address)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if code.is_empty() {
        return Err(ScriptError::NotAProxy(format!(
            "no contract deployed at {address:#x} on chain {}",
            client.chain_id
        )));
    }

    Ok(())
}
