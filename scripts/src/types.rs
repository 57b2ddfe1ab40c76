//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use clap::ValueEnum;

/// The networks the scripts know how to reach
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Network {
    /// A throwaway development node, spawned for the duration of the command
    Hardhat,
    /// A development node already running on the local machine
    Local,
    /// The Rinkeby public testnet
    #[default]
    Rinkeby,
}

impl Network {
    /// All known networks, in display order
    pub const ALL: [Network; 3] = [Network::Hardhat, Network::Local, Network::Rinkeby];

    /// The key under which this network's deployments are recorded
    pub fn name(&self) -> &'static str {
        match self {
            Network::Hardhat => "hardhat",
            Network::Local => "local",
            Network::Rinkeby => "rinkeby",
        }
    }

    /// Whether the network runs the well-known development accounts
    pub fn is_development(&self) -> bool {
        matches!(self, Network::Hardhat | Network::Local)
    }

    /// Whether deployments on this network outlive the command and should be recorded
    pub fn saves_deployments(&self) -> bool {
        !matches!(self, Network::Hardhat)
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
