//! Definitions of errors that can occur during the execution of the contract management scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the contract management scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error resolving the network, account, or compiler configuration
    Config(String),
    /// Error reading the deployments manifest
    ReadDeployments(String),
    /// Error writing the deployments manifest
    WriteDeployments(String),
    /// Error locating or reading a compilation artifact
    ReadArtifact(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// Error parsing an address argument
    InvalidAddress(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The target address is not an EIP-1967 proxy
    NotAProxy(String),
    /// The deployer is not allowed to perform the operation
    Unauthorized(String),
    /// The proxy did not end up pointing at the expected implementation
    UpgradeVerification(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Config(s) => write!(f, "error in configuration: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ReadArtifact(s) => write!(f, "error reading artifact: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::InvalidAddress(s) => write!(f, "invalid address: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::NotAProxy(s) => write!(f, "not an upgradeable proxy: {}", s),
            ScriptError::Unauthorized(s) => write!(f, "unauthorized: {}", s),
            ScriptError::UpgradeVerification(s) => write!(f, "error verifying upgrade: {}", s),
        }
    }
}

impl Error for ScriptError {}
