// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Action Dispatch Surface
//!
//! User-triggered operations. Each one calls into the host shell or the
//! wallet controller and turns the outcome into a single display line. No
//! error leaves this module.
//!
//! Fire-and-forget host actions (open URL, compose, view, close, primary
//! button) return `None` on success and an `Error: ...` line otherwise.
//! Add-to-host, send-notification, and sign-in keep their last result so
//! the UI can render it after the call returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::host::{CapabilityBridge, ComposeCast, HostError, HostShell, PrimaryButton};
use crate::manifest::{self, AccountAssociation};
use crate::notify::NotificationClient;
use crate::pending::{PendingOperation, Ticket};
use crate::wallet::{SendTransactionRequest, SignTypedDataRequest, WalletController};

/// Shown for any sign-in failure; the host's reason is only logged.
pub const SIGN_IN_FAILED: &str = "Unknown error";

const SESSION_CLOSED: &str = "Error: session closed";

/// Host actions whose result is kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedAction {
    AddToHost,
    SendNotification,
    SignIn,
}

type ResultSlot = PendingOperation<String, String>;

#[derive(Default)]
struct Results {
    add_to_host: ResultSlot,
    send_notification: ResultSlot,
    sign_in: ResultSlot,
    closed: bool,
}

impl Results {
    fn slot(&mut self, action: TrackedAction) -> &mut ResultSlot {
        match action {
            TrackedAction::AddToHost => &mut self.add_to_host,
            TrackedAction::SendNotification => &mut self.send_notification,
            TrackedAction::SignIn => &mut self.sign_in,
        }
    }
}

pub struct ActionDispatcher {
    shell: Arc<dyn HostShell>,
    bridge: CapabilityBridge,
    wallet: Arc<WalletController>,
    notifier: NotificationClient,
    results: Mutex<Results>,
}

impl ActionDispatcher {
    pub fn new(
        shell: Arc<dyn HostShell>,
        bridge: CapabilityBridge,
        wallet: Arc<WalletController>,
        notifier: NotificationClient,
    ) -> Self {
        Self {
            shell,
            bridge,
            wallet,
            notifier,
            results: Mutex::new(Results::default()),
        }
    }

    fn results(&self) -> MutexGuard<'_, Results> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bridge(&self) -> &CapabilityBridge {
        &self.bridge
    }

    pub fn wallet(&self) -> &Arc<WalletController> {
        &self.wallet
    }

    /// Last stored line for `action`, success or failure.
    pub fn result(&self, action: TrackedAction) -> Option<String> {
        let mut results = self.results();
        let slot = results.slot(action);
        slot.data().or_else(|| slot.error()).cloned()
    }

    pub fn is_pending(&self, action: TrackedAction) -> bool {
        self.results().slot(action).is_pending()
    }

    /// Discard every late result from now on.
    pub fn teardown(&self) {
        self.results().closed = true;
        self.wallet.teardown();
        self.bridge.close();
    }

    fn begin(&self, action: TrackedAction) -> Option<Ticket> {
        let mut results = self.results();
        if results.closed {
            return None;
        }
        Some(results.slot(action).begin())
    }

    fn settle(
        &self,
        action: TrackedAction,
        ticket: Ticket,
        outcome: Result<String, String>,
    ) {
        let mut results = self.results();
        if results.closed || !results.slot(action).settle(ticket, outcome) {
            debug!(?action, "Discarding stale action result");
        }
    }

    // =========================================================================
    // Fire-and-forget host actions
    // =========================================================================

    fn report(action: &'static str, result: Result<(), HostError>) -> Option<String> {
        match result {
            Ok(()) => {
                debug!(action, "Host action completed");
                None
            }
            Err(e) => {
                warn!(action, error = %e, "Host action failed");
                Some(format!("Error: {e}"))
            }
        }
    }

    pub async fn open_url(&self, raw: &str) -> Option<String> {
        let result = match url::Url::parse(raw.trim()) {
            Ok(url) => self.shell.open_url(url.as_str()).await,
            Err(e) => Err(HostError::Capability(format!("Invalid URL {raw:?}: {e}"))),
        };
        Self::report("open_url", result)
    }

    pub async fn compose_cast(&self, text: &str, embeds: Vec<String>) -> Option<String> {
        let cast = ComposeCast {
            text: text.to_string(),
            embeds,
        };
        Self::report("compose_cast", self.shell.compose_cast(&cast).await)
    }

    /// `fid` comes straight from a text input.
    pub async fn view_profile(&self, fid: &str) -> Option<String> {
        let result = match fid.trim().parse::<u64>() {
            Ok(fid) if fid > 0 => self.shell.view_profile(fid).await,
            _ => Err(HostError::Capability(format!(
                "fid must be a positive integer, got {fid:?}"
            ))),
        };
        Self::report("view_profile", result)
    }

    pub async fn view_cast(&self, hash: &str, close: bool) -> Option<String> {
        let hash = hash.trim();
        let result = if hash.is_empty() {
            Err(HostError::Capability("cast hash is empty".to_string()))
        } else {
            self.shell.view_cast(hash, close).await
        };
        Self::report("view_cast", result)
    }

    pub async fn set_primary_button(&self, button: &PrimaryButton) -> Option<String> {
        Self::report(
            "set_primary_button",
            self.shell.set_primary_button(button).await,
        )
    }

    pub async fn close(&self) -> Option<String> {
        Self::report("close", self.shell.close().await)
    }

    // =========================================================================
    // Tracked host actions
    // =========================================================================

    /// Ask the host to add the app. The previous grant is cleared first so a
    /// stale one is never mistaken for a fresh grant.
    pub async fn add_to_host(&self) -> String {
        let Some(ticket) = self.begin(TrackedAction::AddToHost) else {
            return SESSION_CLOSED.to_string();
        };
        self.bridge.clear_notification_details();

        let outcome = match self.shell.add_frame().await {
            Ok(result) => match result.notification_details {
                Some(details) => {
                    let line = format!(
                        "Added, got notification token {} and url {}",
                        details.token, details.url
                    );
                    self.bridge.grant_notifications(details);
                    info!("App added with notification grant");
                    Ok(line)
                }
                None => {
                    info!("App added without notification grant");
                    Ok("Added, got no notification details".to_string())
                }
            },
            Err(e @ (HostError::RejectedByUser(_) | HostError::InvalidDomainManifest(_))) => {
                info!(error = %e, "App not added");
                Err(format!("Not added: {e}"))
            }
            Err(e) => {
                warn!(error = %e, "Add to host failed");
                Err(format!("Error: {e}"))
            }
        };

        let line = outcome.clone().unwrap_or_else(|e| e);
        self.settle(TrackedAction::AddToHost, ticket, outcome);
        line
    }

    /// Send a test notification through the relay. Returns `None` when there
    /// is no grant or no context; no request is made in that case.
    pub async fn send_notification(&self) -> Option<String> {
        let ticket = self.begin(TrackedAction::SendNotification)?;

        let state = self.bridge.snapshot();
        let fid = state.context.fid();
        let details = state.notification_details.as_ref().filter(|_| state.can_notify());

        let Some(outcome) = self.notifier.send(fid, details).await else {
            let mut results = self.results();
            if !results.closed {
                results.send_notification.reset();
            }
            return None;
        };

        let line = outcome.label();
        let stored = match outcome.kind() {
            None => Ok(line.clone()),
            Some(_) => Err(line.clone()),
        };
        self.settle(TrackedAction::SendNotification, ticket, stored);
        Some(line)
    }

    /// Sign in with the host. Any failure renders as a fixed line.
    pub async fn sign_in(&self, nonce: &str) -> String {
        let Some(ticket) = self.begin(TrackedAction::SignIn) else {
            return SIGN_IN_FAILED.to_string();
        };

        let outcome = if nonce.trim().is_empty() {
            warn!("Sign-in attempted without a nonce");
            Err(SIGN_IN_FAILED.to_string())
        } else {
            match self.shell.sign_in(nonce).await {
                Ok(result) => {
                    info!("Signed in with host");
                    serde_json::to_string_pretty(&result).map_err(|e| {
                        warn!(error = %e, "Could not render sign-in result");
                        SIGN_IN_FAILED.to_string()
                    })
                }
                Err(e) if e.is_user_rejection() => {
                    info!(error = %e, "Sign-in declined");
                    Err(SIGN_IN_FAILED.to_string())
                }
                Err(e) => {
                    warn!(error = %e, "Sign-in failed");
                    Err(SIGN_IN_FAILED.to_string())
                }
            }
        };

        let line = outcome.clone().unwrap_or_else(|e| e);
        self.settle(TrackedAction::SignIn, ticket, outcome);
        line
    }

    // =========================================================================
    // Wallet actions
    // =========================================================================

    pub async fn toggle_wallet(&self) -> Option<String> {
        self.wallet.toggle_connection().await.err().map(|e| e.render())
    }

    /// Returns the signature hex or the rendered error.
    pub async fn sign_message(&self, text: &str) -> String {
        match self.wallet.sign_message(text).await {
            Ok(signature) => signature.to_string(),
            Err(e) => e.render(),
        }
    }

    pub async fn sign_typed_data(&self, content: &str) -> String {
        match self
            .wallet
            .sign_typed_data(SignTypedDataRequest::demo(content))
            .await
        {
            Ok(signature) => signature.to_string(),
            Err(e) => e.render(),
        }
    }

    /// Returns the transaction hash or the rendered error.
    pub async fn send_transaction(&self, request: SendTransactionRequest) -> String {
        match self.wallet.send_transaction(request).await {
            Ok(hash) => hash.to_string(),
            Err(e) => e.render(),
        }
    }

    pub async fn switch_chain(&self) -> String {
        match self.wallet.switch_chain_toggle().await {
            Ok(chain_id) => format!("Switched to chain {chain_id}"),
            Err(e) => e.render(),
        }
    }

    /// Sign the manifest account association for `domain`. Uses the fid
    /// from the host context when `fid` is not given.
    pub async fn sign_manifest(
        &self,
        fid: Option<u64>,
        domain: &str,
    ) -> Result<AccountAssociation, String> {
        let fid = fid.or_else(|| self.bridge.snapshot().context.fid());
        manifest::sign_manifest(&self.wallet, fid, domain)
            .await
            .map_err(|e| match e {
                manifest::ManifestError::Signing(inner) => inner.render(),
                other => other.to_string(),
            })
    }
}
