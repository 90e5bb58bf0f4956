//! Registry of the networks this protocol implementation supports.
//!
//! Unlike a general-purpose CAIP-2 chain registry, the set of networks here is
//! closed and small: exactly the networks a resource server or client is
//! allowed to name in `network` fields on the wire. `bsc-mainnet` is kept as
//! the name an existing facilitator deployment expects even though it maps to
//! a Base Sepolia chain id, not a BSC one — that mismatch is load-bearing
//! wire compatibility, not a typo.

use std::collections::HashMap;
use std::sync::LazyLock;

/// One of the networks this implementation is willing to quote a price on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Base,
    BscMainnet,
    AvalancheFuji,
    Avalanche,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Base,
        Network::BscMainnet,
        Network::AvalancheFuji,
        Network::Avalanche,
    ];

    /// The wire name, exactly as it appears in `network` fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Base => "base",
            Network::BscMainnet => "bsc-mainnet",
            Network::AvalancheFuji => "avalanche-fuji",
            Network::Avalanche => "avalanche",
        }
    }

    /// `true` for the network the paywall marks as a testnet.
    ///
    /// This checks the network *name*, never the chain id, per the
    /// `bsc-mainnet` naming inconsistency this registry otherwise mirrors
    /// without comment.
    pub fn is_testnet(self) -> bool {
        matches!(self, Network::BscMainnet)
    }

    pub fn chain_id(self) -> u64 {
        match self {
            Network::Base => 8453,
            Network::BscMainnet => 84532,
            Network::AvalancheFuji => 43113,
            Network::Avalanche => 43114,
        }
    }

    fn from_str_exact(s: &str) -> Option<Network> {
        Network::ALL.into_iter().find(|n| n.as_str() == s)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default token information recorded for a network: the asset this
/// implementation quotes USD prices against.
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub human_name: &'static str,
    pub address: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub decimals: u8,
}

struct NetworkEntry {
    network: Network,
    usdc: TokenInfo,
}

static REGISTRY: &[NetworkEntry] = &[
    NetworkEntry {
        network: Network::BscMainnet,
        usdc: TokenInfo {
            human_name: "usdc",
            address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            name: "USDC",
            version: "2",
            decimals: 6,
        },
    },
    NetworkEntry {
        network: Network::Base,
        usdc: TokenInfo {
            human_name: "usdc",
            address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
            name: "USD Coin",
            version: "2",
            decimals: 6,
        },
    },
    NetworkEntry {
        network: Network::AvalancheFuji,
        usdc: TokenInfo {
            human_name: "usdc",
            address: "0x5425890298aed601595a70AB815c96711a31Bc65",
            name: "USD Coin",
            version: "2",
            decimals: 6,
        },
    },
    NetworkEntry {
        network: Network::Avalanche,
        usdc: TokenInfo {
            human_name: "usdc",
            address: "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E",
            name: "USDC",
            version: "2",
            decimals: 6,
        },
    },
];

static BY_NETWORK: LazyLock<HashMap<Network, &'static TokenInfo>> = LazyLock::new(|| {
    REGISTRY
        .iter()
        .map(|entry| (entry.network, &entry.usdc))
        .collect()
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainRegistryError {
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),
    #[error("unknown token {human_name} on network {network}")]
    UnknownToken {
        network: String,
        human_name: String,
    },
}

/// Resolves a `network` field to a chain id.
///
/// A numeric string is returned as-is (passthrough for raw chain IDs),
/// matching the reference behavior of accepting either a network name or an
/// already-numeric chain id wherever a network is expected.
pub fn chain_id_for(network: &str) -> Result<u64, ChainRegistryError> {
    if let Ok(id) = network.parse::<u64>() {
        return Ok(id);
    }
    Network::from_str_exact(network)
        .map(Network::chain_id)
        .ok_or_else(|| ChainRegistryError::UnsupportedNetwork(network.to_string()))
}

/// Parses a `network` field into the closed [`Network`] enumeration.
///
/// Unlike [`chain_id_for`], this has no numeric passthrough: it is used
/// wherever the wire value must name one of the enumerated networks, not an
/// arbitrary chain id (e.g. middleware construction, the paywall's testnet
/// check).
pub fn parse_network(network: &str) -> Result<Network, ChainRegistryError> {
    Network::from_str_exact(network)
        .ok_or_else(|| ChainRegistryError::UnsupportedNetwork(network.to_string()))
}

/// The default USDC token recorded for `network`.
pub fn default_usdc(network: Network) -> &'static TokenInfo {
    BY_NETWORK
        .get(&network)
        .expect("REGISTRY covers every Network variant")
}

/// Looks up token metadata by `(network, address)`, the shape the EIP-712
/// domain resolution needs when a caller names an asset address directly.
pub fn token_by_address(network: Network, address: &str) -> Result<&'static TokenInfo, ChainRegistryError> {
    let token = default_usdc(network);
    if token.address.eq_ignore_ascii_case(address) {
        Ok(token)
    } else {
        Err(ChainRegistryError::UnknownToken {
            network: network.as_str().to_string(),
            human_name: address.to_string(),
        })
    }
}
