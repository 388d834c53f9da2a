// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mini-App Bridge - Host Capability & Wallet State Reconciliation
//!
//! Client-side core for an embedded mini-application. It runs the one-time
//! handshake with the host shell, folds host-pushed events into a single
//! capability view, drives wallet actions with independent pending state,
//! and turns every user action into a displayable result line.
//!
//! ## Modules
//!
//! - `host` - Host handshake, event subscription, capability bridge
//! - `wallet` - Wallet connectors, session, interaction controller, receipts
//! - `dispatch` - User-triggered actions mapped to result strings
//! - `notify` - Notification relay client
//! - `manifest` - Manifest account-association signing and verification
//! - `pending` - Per-action pending/result state with stale-result tickets
//! - `config` - Environment configuration
//! - `telemetry` - Tracing setup
//!
//! ## Wiring
//!
//! ```rust,ignore
//! let config = BridgeConfig::from_env()?;
//! telemetry::init_tracing(config.log_format);
//!
//! let gateway = config.host_gateway(shell.clone());
//! let bridge = CapabilityBridge::new();
//! if let Some(mut session) = gateway.initialize().await.into_session() {
//!     if let Some(subscription) = bridge.attach(&mut session) {
//!         tokio::spawn({ let bridge = bridge.clone(); async move { bridge.run(subscription, shutdown).await } });
//!     }
//! }
//!
//! let wallet = Arc::new(config.wallet_controller(connectors)?);
//! let dispatcher = ActionDispatcher::new(shell, bridge, wallet, config.notification_client()?);
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod manifest;
pub mod notify;
pub mod pending;
pub mod telemetry;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use config::{BridgeConfig, ConfigError};
pub use dispatch::{ActionDispatcher, TrackedAction};
pub use error::{Classify, FailureKind};
pub use host::{CapabilityBridge, CapabilityState, Context, HostEvent, HostGateway, HostShell};
pub use notify::{NotificationClient, NotificationOutcome, RelayError};
pub use pending::{OperationState, PendingOperation};
pub use wallet::{WalletConnector, WalletController, WalletError, WalletSession};
