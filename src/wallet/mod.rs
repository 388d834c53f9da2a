// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet interaction.
//!
//! This module provides:
//! - Supported chain configuration (Base, Optimism)
//! - The connector boundary and the session it produces
//! - The interaction controller with per-action pending/result/error state
//! - Receipt watching over JSON-RPC

pub mod chains;
pub mod connector;
pub mod controller;
pub mod error;
pub mod receipt;
pub mod session;

pub use chains::{NetworkConfig, BASE, DEFAULT_CHAIN, OPTIMISM, SUPPORTED_CHAINS};
pub use connector::{
    Connection, ConnectorInfo, SendTransactionRequest, SignTypedDataRequest, TypedDataDomain,
    TypedField, WalletConnector,
};
pub use controller::{WalletAction, WalletController};
pub use error::{WalletError, REJECTED_BY_USER};
pub use receipt::{ReceiptInfo, ReceiptSource, ReceiptWatch, RpcReceiptSource, TxStatus};
pub use session::{truncate_address, WalletSession};
