// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet connector boundary.
//!
//! A [`WalletConnector`] is one way of reaching a wallet (injected provider,
//! host-provided wallet, WalletConnect, ...). The controller talks to
//! connectors only through this trait.

use std::collections::BTreeMap;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::WalletError;

/// Identity of a connector, for selection and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
}

/// Result of a successful connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: Address,
    pub chain_id: u64,
}

/// EIP-712 domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
}

/// One field of an EIP-712 struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Typed-data signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTypedDataRequest {
    pub domain: TypedDataDomain,
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub primary_type: String,
    pub message: Value,
}

impl SignTypedDataRequest {
    /// The demo `Message { content: string }` payload.
    pub fn demo(content: impl Into<String>) -> Self {
        let mut types = BTreeMap::new();
        types.insert("Message".to_string(), vec![TypedField::new("content", "string")]);

        Self {
            domain: TypedDataDomain {
                name: Some("Frames v2 Demo".to_string()),
                version: Some("1".to_string()),
                chain_id: None,
                verifying_contract: None,
            },
            types,
            primary_type: "Message".to_string(),
            message: json!({ "content": content.into() }),
        }
    }
}

/// Transaction to submit through the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTransactionRequest {
    pub to: Address,
    pub data: Option<Bytes>,
    pub value: Option<U256>,
}

impl SendTransactionRequest {
    pub fn new(to: Address) -> Self {
        Self {
            to,
            data: None,
            value: None,
        }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// Capabilities of one wallet connector.
///
/// Implementations map a user declining a prompt to
/// [`WalletError::UserRejected`]; every other wallet-side failure is
/// [`WalletError::Signer`] or [`WalletError::Transport`].
#[async_trait]
pub trait WalletConnector: Send + Sync {
    fn info(&self) -> ConnectorInfo;

    async fn connect(&self, chain_id: Option<u64>) -> Result<Connection, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Personal-sign `message`. Returns the raw 65-byte signature.
    async fn sign_message(&self, message: &str) -> Result<Bytes, WalletError>;

    async fn sign_typed_data(&self, request: &SignTypedDataRequest) -> Result<Bytes, WalletError>;

    /// Submit a transaction and return its hash.
    async fn send_transaction(&self, request: &SendTransactionRequest) -> Result<B256, WalletError>;

    /// Move the wallet to `chain_id`; returns the chain actually selected.
    async fn switch_chain(&self, chain_id: u64) -> Result<u64, WalletError>;
}
