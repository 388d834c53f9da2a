// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::Address;
use serde::Serialize;

use super::chains::DEFAULT_CHAIN;

/// Active wallet connection as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub address: Option<Address>,
    pub chain_id: u64,
    pub is_connected: bool,
    /// Id of the connector that produced the connection.
    pub connector_id: Option<String>,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self {
            address: None,
            chain_id: DEFAULT_CHAIN.chain_id,
            is_connected: false,
            connector_id: None,
        }
    }
}

impl WalletSession {
    pub fn truncated_address(&self) -> Option<String> {
        self.address
            .map(|address| truncate_address(&address.to_checksum(None)))
    }
}

/// Shorten an address or hash to `0x1234...abcd` for display.
pub fn truncate_address(value: &str) -> String {
    if value.len() <= 12 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}
