// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Interaction Controller
//!
//! Wraps the wallet capabilities as independent asynchronous actions. Each
//! action has its own [`PendingOperation`], so several can be in flight at
//! once and the UI can show each one's pending flag, result, and error.
//!
//! Actions do not queue. Starting an action that is already pending
//! supersedes the earlier run: the earlier result is still returned to its
//! caller but no longer recorded. Callers are expected to disable the
//! triggering control while [`WalletController::is_pending`] is true.
//!
//! The controller is the only writer of [`WalletSession`]. It changes only
//! on connect, disconnect, and switch-chain outcomes.
//!
//! After [`WalletController::teardown`] no result is recorded anymore; an
//! action that settles late simply returns to its caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alloy::primitives::{Bytes, B256};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::chains::{self, DEFAULT_CHAIN};
use super::connector::{
    Connection, ConnectorInfo, SendTransactionRequest, SignTypedDataRequest, WalletConnector,
};
use super::error::WalletError;
use super::receipt::{ReceiptSource, ReceiptWatch, DEFAULT_POLL_INTERVAL};
use super::session::WalletSession;
use crate::error::Classify;
use crate::pending::{OperationState, PendingOperation};

/// The independently tracked wallet actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletAction {
    Connect,
    SignMessage,
    SignTypedData,
    SendTransaction,
    SwitchChain,
    SignManifest,
}

impl WalletAction {
    pub fn name(&self) -> &'static str {
        match self {
            WalletAction::Connect => "connect",
            WalletAction::SignMessage => "sign_message",
            WalletAction::SignTypedData => "sign_typed_data",
            WalletAction::SendTransaction => "send_transaction",
            WalletAction::SwitchChain => "switch_chain",
            WalletAction::SignManifest => "sign_manifest",
        }
    }
}

#[derive(Default)]
struct Operations {
    connect: PendingOperation<Connection, WalletError>,
    sign_message: PendingOperation<Bytes, WalletError>,
    sign_typed_data: PendingOperation<Bytes, WalletError>,
    send_transaction: PendingOperation<B256, WalletError>,
    switch_chain: PendingOperation<u64, WalletError>,
    sign_manifest: PendingOperation<Bytes, WalletError>,
}

impl Operations {
    fn status(&self, action: WalletAction) -> (bool, Option<&WalletError>) {
        fn project<T>(op: &PendingOperation<T, WalletError>) -> (bool, Option<&WalletError>) {
            (op.is_pending(), op.error())
        }
        match action {
            WalletAction::Connect => project(&self.connect),
            WalletAction::SignMessage => project(&self.sign_message),
            WalletAction::SignTypedData => project(&self.sign_typed_data),
            WalletAction::SendTransaction => project(&self.send_transaction),
            WalletAction::SwitchChain => project(&self.switch_chain),
            WalletAction::SignManifest => project(&self.sign_manifest),
        }
    }
}

struct Inner {
    active: Option<Arc<dyn WalletConnector>>,
    ops: Operations,
    closed: bool,
}

/// Coordinates wallet actions for one UI session.
pub struct WalletController {
    connectors: Vec<Arc<dyn WalletConnector>>,
    receipt_sources: HashMap<u64, Arc<dyn ReceiptSource>>,
    receipt_poll_interval: Duration,
    receipt_timeout: Option<Duration>,
    session: watch::Sender<WalletSession>,
    inner: Mutex<Inner>,
}

impl WalletController {
    pub fn new(connectors: Vec<Arc<dyn WalletConnector>>) -> Self {
        let (session, _rx) = watch::channel(WalletSession::default());
        Self {
            connectors,
            receipt_sources: HashMap::new(),
            receipt_poll_interval: DEFAULT_POLL_INTERVAL,
            receipt_timeout: None,
            session,
            inner: Mutex::new(Inner {
                active: None,
                ops: Operations::default(),
                closed: false,
            }),
        }
    }

    /// Register where receipts for `chain_id` are read from.
    pub fn with_receipt_source(mut self, chain_id: u64, source: Arc<dyn ReceiptSource>) -> Self {
        self.receipt_sources.insert(chain_id, source);
        self
    }

    pub fn with_receipt_polling(mut self, interval: Duration, timeout: Option<Duration>) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connectors(&self) -> Vec<ConnectorInfo> {
        self.connectors.iter().map(|c| c.info()).collect()
    }

    pub fn session(&self) -> WalletSession {
        self.session.borrow().clone()
    }

    /// Read-only session view notified on every change.
    pub fn subscribe_session(&self) -> watch::Receiver<WalletSession> {
        self.session.subscribe()
    }

    pub fn is_pending(&self, action: WalletAction) -> bool {
        self.lock().ops.status(action).0
    }

    /// Rendered error of the last run of `action`, if it failed.
    pub fn error_text(&self, action: WalletAction) -> Option<String> {
        self.lock().ops.status(action).1.map(WalletError::render)
    }

    pub fn error(&self, action: WalletAction) -> Option<WalletError> {
        self.lock().ops.status(action).1.cloned()
    }

    /// Last signature produced by `sign_message`.
    pub fn signature(&self) -> Option<Bytes> {
        self.lock().ops.sign_message.data().cloned()
    }

    pub fn typed_signature(&self) -> Option<Bytes> {
        self.lock().ops.sign_typed_data.data().cloned()
    }

    /// Last manifest account-association signature.
    pub fn manifest_signature(&self) -> Option<Bytes> {
        self.lock().ops.sign_manifest.data().cloned()
    }

    /// Hash of the last submitted transaction.
    pub fn tx_hash(&self) -> Option<B256> {
        self.lock().ops.send_transaction.data().copied()
    }

    pub fn send_transaction_state(&self) -> OperationState<B256, WalletError> {
        self.lock().ops.send_transaction.state().clone()
    }

    /// Stop recording results. Late completions are discarded.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.active = None;
        debug!("Wallet controller torn down");
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Run `fut` as one tracked action.
    async fn track<T, Fut>(
        &self,
        action: WalletAction,
        select: fn(&mut Operations) -> &mut PendingOperation<T, WalletError>,
        fut: Fut,
    ) -> Result<T, WalletError>
    where
        T: Clone,
        Fut: Future<Output = Result<T, WalletError>>,
    {
        let ticket = {
            let mut inner = self.lock();
            if inner.closed {
                return Err(WalletError::Closed);
            }
            select(&mut inner.ops).begin()
        };

        let result = fut.await;

        let mut inner = self.lock();
        if inner.closed {
            debug!(action = action.name(), "Discarding result after teardown");
        } else if !select(&mut inner.ops).settle(ticket, result.clone()) {
            debug!(action = action.name(), "Discarding superseded result");
        }

        match &result {
            Ok(_) => debug!(action = action.name(), "Wallet action succeeded"),
            Err(e) if e.kind().is_expected() => {
                info!(action = action.name(), kind = %e.kind(), "Wallet action declined")
            }
            Err(e) => warn!(action = action.name(), error = %e, "Wallet action failed"),
        }
        result
    }

    fn active_connector(&self) -> Result<Arc<dyn WalletConnector>, WalletError> {
        let inner = self.lock();
        if inner.closed {
            return Err(WalletError::Closed);
        }
        match (&inner.active, self.session.borrow().is_connected) {
            (Some(connector), true) => Ok(Arc::clone(connector)),
            _ => Err(WalletError::NotConnected),
        }
    }

    /// Connect through `connectors[index]`, defaulting to the first one.
    pub async fn connect(
        &self,
        index: Option<usize>,
        chain_id: Option<u64>,
    ) -> Result<Connection, WalletError> {
        let connector = self
            .connectors
            .get(index.unwrap_or(0))
            .cloned()
            .ok_or(WalletError::NoConnector)?;
        let info = connector.info();

        let connection = self
            .track(WalletAction::Connect, |ops| &mut ops.connect, async {
                connector.connect(chain_id).await
            })
            .await?;

        let mut inner = self.lock();
        if inner.closed {
            return Ok(connection);
        }
        inner.active = Some(connector);
        self.session.send_modify(|session| {
            session.address = Some(connection.address);
            session.chain_id = connection.chain_id;
            session.is_connected = true;
            session.connector_id = Some(info.id.clone());
        });
        info!(
            connector = %info.id,
            address = %connection.address,
            chain_id = connection.chain_id,
            "Wallet connected"
        );
        Ok(connection)
    }

    /// Disconnect the active connector. A no-op when not connected.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let connector = match self.active_connector() {
            Ok(connector) => connector,
            Err(WalletError::NotConnected) => return Ok(()),
            Err(e) => return Err(e),
        };

        if let Err(e) = connector.disconnect().await {
            warn!(error = %e, "Connector reported an error while disconnecting");
        }

        let mut inner = self.lock();
        if inner.closed {
            return Ok(());
        }
        inner.active = None;
        self.session.send_modify(|session| {
            session.address = None;
            session.is_connected = false;
            session.connector_id = None;
        });
        info!("Wallet disconnected");
        Ok(())
    }

    /// Connect when disconnected, disconnect when connected.
    pub async fn toggle_connection(&self) -> Result<(), WalletError> {
        if self.session.borrow().is_connected {
            self.disconnect().await
        } else {
            self.connect(None, None).await.map(|_| ())
        }
    }

    /// Personal-sign `text`. Connects with the default connector on the
    /// default chain first if needed.
    pub async fn sign_message(&self, text: &str) -> Result<Bytes, WalletError> {
        if !self.session.borrow().is_connected {
            self.connect(None, Some(DEFAULT_CHAIN.chain_id)).await?;
        }
        let connector = self.active_connector()?;

        self.track(WalletAction::SignMessage, |ops| &mut ops.sign_message, async {
            connector.sign_message(text).await
        })
        .await
    }

    /// Personal-sign a manifest signing input. Tracked apart from
    /// [`Self::sign_message`] and never connects on its own.
    pub async fn sign_manifest_input(&self, input: &str) -> Result<Bytes, WalletError> {
        let connector = self.active_connector()?;

        self.track(WalletAction::SignManifest, |ops| &mut ops.sign_manifest, async {
            connector.sign_message(input).await
        })
        .await
    }

    /// Sign EIP-712 typed data. The domain's `chainId` is always taken from
    /// the current session.
    pub async fn sign_typed_data(
        &self,
        mut request: SignTypedDataRequest,
    ) -> Result<Bytes, WalletError> {
        let connector = self.active_connector()?;
        request.domain.chain_id = Some(self.session.borrow().chain_id);

        self.track(
            WalletAction::SignTypedData,
            |ops| &mut ops.sign_typed_data,
            async { connector.sign_typed_data(&request).await },
        )
        .await
    }

    /// Submit a transaction and return its hash.
    pub async fn send_transaction(
        &self,
        request: SendTransactionRequest,
    ) -> Result<B256, WalletError> {
        let connector = self.active_connector()?;

        let hash = self
            .track(
                WalletAction::SendTransaction,
                |ops| &mut ops.send_transaction,
                async { connector.send_transaction(&request).await },
            )
            .await?;

        info!(tx_hash = %hash, to = %request.to, "Transaction submitted");
        Ok(hash)
    }

    /// Start watching the receipt of `tx_hash` on the current chain.
    pub fn watch_receipt(&self, tx_hash: B256) -> Result<ReceiptWatch, WalletError> {
        let chain_id = self.session.borrow().chain_id;
        let source = self
            .receipt_sources
            .get(&chain_id)
            .cloned()
            .ok_or(WalletError::UnsupportedChain(chain_id))?;

        Ok(ReceiptWatch::new(tx_hash, source)
            .with_poll_interval(self.receipt_poll_interval)
            .with_timeout(self.receipt_timeout))
    }

    /// Switch to `target`. Unsupported chains fail before reaching the wallet.
    pub async fn switch_chain(&self, target: u64) -> Result<u64, WalletError> {
        let connector = match self.active_connector() {
            Ok(connector) => Some(connector),
            Err(WalletError::NotConnected) => None,
            Err(e) => return Err(e),
        };

        let chain_id = self
            .track(WalletAction::SwitchChain, |ops| &mut ops.switch_chain, async {
                if !chains::is_supported(target) {
                    return Err(WalletError::UnsupportedChain(target));
                }
                match connector {
                    Some(connector) => connector.switch_chain(target).await,
                    None => Ok(target),
                }
            })
            .await?;

        if !self.is_closed() {
            self.session.send_modify(|session| session.chain_id = chain_id);
            info!(chain_id, "Switched chain");
        }
        Ok(chain_id)
    }

    /// Switch between Base and Optimism.
    pub async fn switch_chain_toggle(&self) -> Result<u64, WalletError> {
        let target = chains::toggle_target(self.session.borrow().chain_id).chain_id;
        self.switch_chain(target).await
    }

    /// Label for the switch control, e.g. `Switch to Optimism`.
    pub fn switch_label(&self) -> String {
        let target = chains::toggle_target(self.session.borrow().chain_id);
        format!("Switch to {}", target.name)
    }
}
