// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory doubles for the host shell, wallet connectors, and receipt
//! sources. Test-only.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::host::{
    AddFrameResult, ComposeCast, EventHandler, HostError, HostEvent, HostEventKind, HostShell,
    PrimaryButton, SignInResult,
};
use crate::wallet::chains::DEFAULT_CHAIN;
use crate::wallet::connector::{
    Connection, ConnectorInfo, SendTransactionRequest, SignTypedDataRequest, WalletConnector,
};
use crate::wallet::error::WalletError;
use crate::wallet::receipt::{ReceiptInfo, ReceiptSource};

/// Well-known development key, never funded on any real network.
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn test_signer() -> PrivateKeySigner {
    TEST_PRIVATE_KEY.parse().unwrap()
}

// =============================================================================
// Host shell
// =============================================================================

pub struct MockShell {
    context: Option<Value>,
    handlers: Mutex<Vec<(HostEventKind, EventHandler)>>,
    ready: AtomicUsize,
    context_requests: AtomicUsize,
    unsubscribes: AtomicUsize,
    actions: Mutex<Vec<String>>,
    add_frame: Mutex<Option<Result<AddFrameResult, HostError>>>,
    sign_in: Mutex<Option<Result<SignInResult, HostError>>>,
    action_error: Mutex<Option<HostError>>,
}

impl MockShell {
    /// A host that answers the handshake with `context`.
    pub fn embedded(context: Value) -> Self {
        Self::with_context(Some(context))
    }

    /// No host at all: the context request fails.
    pub fn absent() -> Self {
        Self::with_context(None)
    }

    fn with_context(context: Option<Value>) -> Self {
        Self {
            context,
            handlers: Mutex::new(Vec::new()),
            ready: AtomicUsize::new(0),
            context_requests: AtomicUsize::new(0),
            unsubscribes: AtomicUsize::new(0),
            actions: Mutex::new(Vec::new()),
            add_frame: Mutex::new(None),
            sign_in: Mutex::new(None),
            action_error: Mutex::new(None),
        }
    }

    pub fn ready_count(&self) -> usize {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn context_requests(&self) -> usize {
        self.context_requests.load(Ordering::SeqCst)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    /// Actions performed so far, as `name` or `name:argument`.
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    /// Deliver `event` to every handler registered for its kind.
    pub fn emit(&self, event: HostEvent) {
        let handlers = self.handlers.lock().unwrap();
        for (kind, handler) in handlers.iter() {
            if *kind == event.kind() {
                handler(event.clone());
            }
        }
    }

    pub fn script_add_frame(&self, result: Result<AddFrameResult, HostError>) {
        *self.add_frame.lock().unwrap() = Some(result);
    }

    pub fn script_sign_in(&self, result: Result<SignInResult, HostError>) {
        *self.sign_in.lock().unwrap() = Some(result);
    }

    /// Make the next plain action fail with `error`.
    pub fn fail_next_action(&self, error: HostError) {
        *self.action_error.lock().unwrap() = Some(error);
    }

    fn record(&self, action: String) -> Result<(), HostError> {
        self.actions.lock().unwrap().push(action);
        match self.action_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl HostShell for MockShell {
    async fn get_context(&self) -> Result<Value, HostError> {
        self.context_requests.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.context
            .clone()
            .ok_or_else(|| HostError::Handshake("no host responded".to_string()))
    }

    async fn send_ready(&self) -> Result<(), HostError> {
        self.ready.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_in_mini_app(&self) -> bool {
        self.context.is_some()
    }

    fn subscribe(&self, kind: HostEventKind, handler: EventHandler) {
        self.handlers.lock().unwrap().push((kind, handler));
    }

    fn unsubscribe_all(&self) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().unwrap().clear();
    }

    async fn open_url(&self, url: &str) -> Result<(), HostError> {
        self.record(format!("open_url:{url}"))
    }

    async fn compose_cast(&self, cast: &ComposeCast) -> Result<(), HostError> {
        self.record(format!("compose_cast:{}", cast.text))
    }

    async fn view_profile(&self, fid: u64) -> Result<(), HostError> {
        self.record(format!("view_profile:{fid}"))
    }

    async fn view_cast(&self, hash: &str, close: bool) -> Result<(), HostError> {
        self.record(format!("view_cast:{hash}:{close}"))
    }

    async fn set_primary_button(&self, button: &PrimaryButton) -> Result<(), HostError> {
        self.record(format!("set_primary_button:{}", button.text))
    }

    async fn close(&self) -> Result<(), HostError> {
        self.record("close".to_string())
    }

    async fn add_frame(&self) -> Result<AddFrameResult, HostError> {
        self.record("add_frame".to_string())?;
        self.add_frame
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(AddFrameResult::default()))
    }

    async fn sign_in(&self, nonce: &str) -> Result<SignInResult, HostError> {
        self.record(format!("sign_in:{nonce}"))?;
        self.sign_in.lock().unwrap().take().unwrap_or_else(|| {
            Ok(SignInResult {
                message: format!("example.com wants you to sign in\nNonce: {nonce}"),
                signature: "0xsigned".to_string(),
            })
        })
    }
}

// =============================================================================
// Wallet connector
// =============================================================================

/// Connector backed by a local key. Signatures are real; transactions are
/// not broadcast and return a scripted hash.
pub struct MockConnector {
    id: String,
    signer: PrivateKeySigner,
    calls: Mutex<Vec<&'static str>>,
    connect_chains: Mutex<Vec<Option<u64>>>,
    typed_data: Mutex<Option<SignTypedDataRequest>>,
    tx_hash: Mutex<B256>,
    sign_error: Mutex<Option<WalletError>>,
    switch_error: Mutex<Option<WalletError>>,
    signing_gate: watch::Sender<bool>,
}

impl MockConnector {
    pub fn new(id: &str) -> Self {
        let (signing_gate, _rx) = watch::channel(false);
        Self {
            id: id.to_string(),
            signer: test_signer(),
            calls: Mutex::new(Vec::new()),
            connect_chains: Mutex::new(Vec::new()),
            typed_data: Mutex::new(None),
            tx_hash: Mutex::new(B256::with_last_byte(1)),
            sign_error: Mutex::new(None),
            switch_error: Mutex::new(None),
            signing_gate,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    /// Chain requested by the most recent connect.
    pub fn last_connect_chain(&self) -> Option<Option<u64>> {
        self.connect_chains.lock().unwrap().last().copied()
    }

    pub fn last_typed_data(&self) -> Option<SignTypedDataRequest> {
        self.typed_data.lock().unwrap().clone()
    }

    pub fn set_tx_hash(&self, hash: B256) {
        *self.tx_hash.lock().unwrap() = hash;
    }

    pub fn fail_next_sign(&self, error: WalletError) {
        *self.sign_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_switch(&self, error: WalletError) {
        *self.switch_error.lock().unwrap() = Some(error);
    }

    /// Park message signing until [`MockConnector::release_signing`].
    pub fn hold_signing(&self) {
        self.signing_gate.send_replace(true);
    }

    pub fn release_signing(&self) {
        self.signing_gate.send_replace(false);
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    async fn pass_gate(&self) {
        let mut gate = self.signing_gate.subscribe();
        let _ = gate.wait_for(|held| !*held).await;
    }

    async fn sign_bytes(&self, payload: &[u8]) -> Result<Bytes, WalletError> {
        if let Some(error) = self.sign_error.lock().unwrap().take() {
            return Err(error);
        }
        let signature = self
            .signer
            .sign_message(payload)
            .await
            .map_err(|e| WalletError::Signer(e.to_string()))?;
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    fn info(&self) -> ConnectorInfo {
        ConnectorInfo {
            id: self.id.clone(),
            name: format!("Mock {}", self.id),
        }
    }

    async fn connect(&self, chain_id: Option<u64>) -> Result<Connection, WalletError> {
        self.record("connect");
        self.connect_chains.lock().unwrap().push(chain_id);
        Ok(Connection {
            address: self.signer.address(),
            chain_id: chain_id.unwrap_or(DEFAULT_CHAIN.chain_id),
        })
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.record("disconnect");
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<Bytes, WalletError> {
        self.record("sign_message");
        self.pass_gate().await;
        self.sign_bytes(message.as_bytes()).await
    }

    async fn sign_typed_data(&self, request: &SignTypedDataRequest) -> Result<Bytes, WalletError> {
        self.record("sign_typed_data");
        *self.typed_data.lock().unwrap() = Some(request.clone());
        let payload =
            serde_json::to_vec(request).map_err(|e| WalletError::InvalidInput(e.to_string()))?;
        self.sign_bytes(&payload).await
    }

    async fn send_transaction(
        &self,
        _request: &SendTransactionRequest,
    ) -> Result<B256, WalletError> {
        self.record("send_transaction");
        Ok(*self.tx_hash.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<u64, WalletError> {
        self.record("switch_chain");
        match self.switch_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(chain_id),
        }
    }
}

// =============================================================================
// Receipt source
// =============================================================================

/// Answers receipt queries from a script, then reports "not yet mined".
pub struct ScriptedReceipts {
    script: Mutex<VecDeque<Result<Option<ReceiptInfo>, WalletError>>>,
    calls: AtomicUsize,
}

impl ScriptedReceipts {
    pub fn new(script: Vec<Result<Option<ReceiptInfo>, WalletError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptSource for ScriptedReceipts {
    async fn receipt(&self, _tx_hash: B256) -> Result<Option<ReceiptInfo>, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}
