// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Supported chains and their defaults.

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
}

/// Base mainnet configuration.
pub const BASE: NetworkConfig = NetworkConfig {
    name: "Base",
    chain_id: 8453,
    rpc_url: "https://mainnet.base.org",
};

/// OP Mainnet configuration.
pub const OPTIMISM: NetworkConfig = NetworkConfig {
    name: "Optimism",
    chain_id: 10,
    rpc_url: "https://mainnet.optimism.io",
};

/// Chains the wallet may be switched to.
pub const SUPPORTED_CHAINS: [NetworkConfig; 2] = [BASE, OPTIMISM];

/// Chain used when connecting without an explicit choice.
pub const DEFAULT_CHAIN: NetworkConfig = BASE;

pub fn network_for(chain_id: u64) -> Option<&'static NetworkConfig> {
    SUPPORTED_CHAINS.iter().find(|n| n.chain_id == chain_id)
}

pub fn is_supported(chain_id: u64) -> bool {
    network_for(chain_id).is_some()
}

/// The chain a "switch" control moves to: Optimism from Base, Base from
/// anything else.
pub fn toggle_target(current_chain_id: u64) -> &'static NetworkConfig {
    if current_chain_id == BASE.chain_id {
        &SUPPORTED_CHAINS[1]
    } else {
        &SUPPORTED_CHAINS[0]
    }
}
