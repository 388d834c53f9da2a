// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction Receipt Watching
//!
//! After a transaction hash is known, the UI shows its status:
//!
//! | Status | Meaning | Label |
//! |--------|---------|-------|
//! | `Pending` | hash known, no answer from the receipt query | `Pending` |
//! | `Confirming` | query answered, no receipt yet | `Confirming...` |
//! | `Confirmed` | receipt found, execution succeeded | `Confirmed!` |
//! | `Reverted` | receipt found, execution failed | `Reverted` |
//!
//! A failing query drops the status back to `Pending` and polling continues.
//! Without a configured timeout the watch never gives up; with one it stops
//! with [`WalletError::ReceiptTimeout`] and leaves the status `Pending`.

use std::sync::Arc;
use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::B256,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::chains::NetworkConfig;
use super::error::WalletError;

/// Default interval between receipt queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Display status of a watched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirming,
    Confirmed,
    Reverted,
}

impl TxStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TxStatus::Pending => "Pending",
            TxStatus::Confirming => "Confirming...",
            TxStatus::Confirmed => "Confirmed!",
            TxStatus::Reverted => "Reverted",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Reverted)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Transaction receipt after inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub tx_hash: B256,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}

/// Where receipts come from.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` while the transaction is not yet included.
    async fn receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, WalletError>;
}

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// JSON-RPC receipt source.
pub struct RpcReceiptSource {
    provider: HttpProvider,
}

impl RpcReceiptSource {
    pub fn new(rpc_url: &str) -> Result<Self, WalletError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| WalletError::InvalidInput(format!("Invalid RPC URL: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url);
        Ok(Self { provider })
    }

    pub fn for_network(network: &NetworkConfig) -> Result<Self, WalletError> {
        Self::new(network.rpc_url)
    }
}

#[async_trait]
impl ReceiptSource for RpcReceiptSource {
    async fn receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, WalletError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| WalletError::Transport(format!("Failed to get receipt: {e}")))?;

        Ok(receipt.map(|r| ReceiptInfo {
            tx_hash,
            block_number: r.block_number.unwrap_or(0),
            gas_used: r.gas_used as u64,
            success: r.status(),
        }))
    }
}

/// Status tracker for one transaction hash.
pub struct ReceiptWatch {
    tx_hash: B256,
    source: Arc<dyn ReceiptSource>,
    status: watch::Sender<TxStatus>,
    receipt: Option<ReceiptInfo>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ReceiptWatch {
    pub fn new(tx_hash: B256, source: Arc<dyn ReceiptSource>) -> Self {
        let (status, _rx) = watch::channel(TxStatus::Pending);
        Self {
            tx_hash,
            source,
            status,
            receipt: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the total wait. `None` polls until a receipt appears.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    pub fn status(&self) -> TxStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<TxStatus> {
        self.status.subscribe()
    }

    pub fn receipt(&self) -> Option<&ReceiptInfo> {
        self.receipt.as_ref()
    }

    fn set_status(&self, next: TxStatus) {
        self.status.send_if_modified(|status| {
            if *status == next {
                return false;
            }
            debug!(tx_hash = %self.tx_hash, from = ?*status, to = ?next, "Receipt status changed");
            *status = next;
            true
        });
    }

    /// Query the source once and update the status.
    pub async fn poll_once(&mut self) -> TxStatus {
        if self.status().is_final() {
            return self.status();
        }

        match self.source.receipt(self.tx_hash).await {
            Ok(Some(receipt)) => {
                let next = if receipt.success {
                    TxStatus::Confirmed
                } else {
                    TxStatus::Reverted
                };
                info!(
                    tx_hash = %self.tx_hash,
                    block_number = receipt.block_number,
                    gas_used = receipt.gas_used,
                    status = %next,
                    "Transaction receipt found"
                );
                self.receipt = Some(receipt);
                self.set_status(next);
            }
            Ok(None) => self.set_status(TxStatus::Confirming),
            Err(e) => {
                warn!(tx_hash = %self.tx_hash, error = %e, "Receipt query failed, will retry");
                self.set_status(TxStatus::Pending);
            }
        }
        self.status()
    }

    /// Poll until the receipt is found, the timeout elapses, or `shutdown`
    /// fires.
    pub async fn wait(&mut self, shutdown: &CancellationToken) -> Result<ReceiptInfo, WalletError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);

        loop {
            if shutdown.is_cancelled() {
                return Err(WalletError::Closed);
            }

            self.poll_once().await;
            if let Some(receipt) = &self.receipt {
                return Ok(receipt.clone());
            }

            let sleep_until = match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    return Err(self.timed_out());
                }
                Some(deadline) => deadline.min(Instant::now() + self.poll_interval),
                None => Instant::now() + self.poll_interval,
            };

            tokio::select! {
                _ = tokio::time::sleep_until(sleep_until) => {},
                _ = shutdown.cancelled() => {
                    debug!(tx_hash = %self.tx_hash, "Receipt watch stopped");
                    return Err(WalletError::Closed);
                }
            }
        }
    }

    fn timed_out(&self) -> WalletError {
        warn!(tx_hash = %self.tx_hash, "Gave up waiting for transaction receipt");
        self.set_status(TxStatus::Pending);
        WalletError::ReceiptTimeout(format!("{:#x}", self.tx_hash))
    }
}
