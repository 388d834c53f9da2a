// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`BridgeConfig`] loaded
//! from them.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RELAY_BASE_URL` | Origin serving `/api/send-notification` | `http://localhost:3000` |
//! | `BASE_RPC_URL` | Base JSON-RPC endpoint for receipts | `https://mainnet.base.org` |
//! | `OPTIMISM_RPC_URL` | Optimism JSON-RPC endpoint for receipts | `https://mainnet.optimism.io` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Receipt poll interval | `4000` |
//! | `RECEIPT_TIMEOUT_SECS` | Give up waiting for a receipt after this long | Unbounded |
//! | `READY_SETTLE_DELAY_MS` | Pause after `ready` before the embed probe | `100` |
//! | `HTTP_TIMEOUT_SECS` | Relay HTTP client timeout | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,miniapp_bridge=debug` |
//!
//! Empty values count as unset.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::host::{HostGateway, HostShell};
use crate::notify::{NotificationClient, RelayError};
use crate::telemetry::LogFormat;
use crate::wallet::chains::{BASE, OPTIMISM, SUPPORTED_CHAINS};
use crate::wallet::{RpcReceiptSource, WalletConnector, WalletController, WalletError};

/// Origin hosting the notification relay route.
pub const RELAY_BASE_URL_ENV: &str = "RELAY_BASE_URL";

/// JSON-RPC endpoint used to read Base receipts.
pub const BASE_RPC_URL_ENV: &str = "BASE_RPC_URL";

/// JSON-RPC endpoint used to read Optimism receipts.
pub const OPTIMISM_RPC_URL_ENV: &str = "OPTIMISM_RPC_URL";

/// Milliseconds between receipt queries.
pub const RECEIPT_POLL_INTERVAL_MS_ENV: &str = "RECEIPT_POLL_INTERVAL_MS";

/// Optional upper bound on a receipt wait, in seconds.
///
/// # Default
/// Unset: the watch keeps polling until the receipt appears or it is
/// cancelled.
pub const RECEIPT_TIMEOUT_SECS_ENV: &str = "RECEIPT_TIMEOUT_SECS";

/// Milliseconds to wait after signalling `ready` before asking the host
/// whether the app is embedded.
pub const READY_SETTLE_DELAY_MS_ENV: &str = "READY_SETTLE_DELAY_MS";

pub const HTTP_TIMEOUT_SECS_ENV: &str = "HTTP_TIMEOUT_SECS";

/// `json` for structured output, anything else for human-readable logs.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_RELAY_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 4_000;
pub const DEFAULT_READY_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the bridge's outward-facing clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub relay_base_url: String,
    pub base_rpc_url: String,
    pub optimism_rpc_url: String,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Option<Duration>,
    pub ready_settle_delay: Duration,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            relay_base_url: DEFAULT_RELAY_BASE_URL.to_string(),
            base_rpc_url: BASE.rpc_url.to_string(),
            optimism_rpc_url: OPTIMISM.rpc_url.to_string(),
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
            receipt_timeout: None,
            ready_settle_delay: Duration::from_millis(DEFAULT_READY_SETTLE_DELAY_MS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            log_format: LogFormat::Pretty,
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let relay_base_url = get(RELAY_BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_RELAY_BASE_URL.to_string());
        if let Err(e) = url::Url::parse(&relay_base_url) {
            return Err(invalid(RELAY_BASE_URL_ENV, &relay_base_url, e));
        }

        let receipt_timeout = match get(RECEIPT_TIMEOUT_SECS_ENV) {
            Some(raw) => Some(Duration::from_secs(parse(RECEIPT_TIMEOUT_SECS_ENV, &raw)?)),
            None => None,
        };

        Ok(Self {
            relay_base_url,
            base_rpc_url: get(BASE_RPC_URL_ENV).unwrap_or_else(|| BASE.rpc_url.to_string()),
            optimism_rpc_url: get(OPTIMISM_RPC_URL_ENV)
                .unwrap_or_else(|| OPTIMISM.rpc_url.to_string()),
            receipt_poll_interval: Duration::from_millis(positive(
                RECEIPT_POLL_INTERVAL_MS_ENV,
                get(RECEIPT_POLL_INTERVAL_MS_ENV),
                DEFAULT_RECEIPT_POLL_INTERVAL_MS,
            )?),
            receipt_timeout,
            ready_settle_delay: Duration::from_millis(match get(READY_SETTLE_DELAY_MS_ENV) {
                Some(raw) => parse(READY_SETTLE_DELAY_MS_ENV, &raw)?,
                None => DEFAULT_READY_SETTLE_DELAY_MS,
            }),
            http_timeout: Duration::from_secs(positive(
                HTTP_TIMEOUT_SECS_ENV,
                get(HTTP_TIMEOUT_SECS_ENV),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            log_format: get(LOG_FORMAT_ENV)
                .map(|raw| LogFormat::from_name(&raw))
                .unwrap_or_default(),
        })
    }

    /// RPC endpoint configured for `chain_id`, if the chain is supported.
    pub fn rpc_url_for(&self, chain_id: u64) -> Option<&str> {
        match chain_id {
            id if id == BASE.chain_id => Some(self.base_rpc_url.as_str()),
            id if id == OPTIMISM.chain_id => Some(self.optimism_rpc_url.as_str()),
            _ => None,
        }
    }

    pub fn host_gateway(&self, shell: Arc<dyn HostShell>) -> HostGateway {
        HostGateway::new(shell).with_ready_settle_delay(self.ready_settle_delay)
    }

    pub fn notification_client(&self) -> Result<NotificationClient, RelayError> {
        NotificationClient::with_timeout(&self.relay_base_url, self.http_timeout)
    }

    /// Controller over `connectors` with an RPC receipt source per
    /// supported chain.
    pub fn wallet_controller(
        &self,
        connectors: Vec<Arc<dyn WalletConnector>>,
    ) -> Result<WalletController, WalletError> {
        let mut controller = WalletController::new(connectors)
            .with_receipt_polling(self.receipt_poll_interval, self.receipt_timeout);
        for network in SUPPORTED_CHAINS.iter() {
            if let Some(rpc_url) = self.rpc_url_for(network.chain_id) {
                let source = RpcReceiptSource::new(rpc_url)?;
                controller = controller.with_receipt_source(network.chain_id, Arc::new(source));
            }
        }
        Ok(controller)
    }
}

fn invalid(name: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| invalid(name, raw, e))
}

fn positive(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match parse::<u64>(name, &raw)? {
        0 => Err(invalid(name, &raw, "must be greater than zero")),
        value => Ok(value),
    }
}
