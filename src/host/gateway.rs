// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Host Context Gateway
//!
//! Performs the one-time handshake with the host shell:
//!
//! 1. fetch the raw context,
//! 2. send `ready` (the host may block interaction until it arrives),
//! 3. wait a short settle delay and probe whether we are really embedded,
//! 4. subscribe to the fixed event set.
//!
//! The subscription is returned as an owned [`HostSubscription`]. Dropping
//! (or explicitly releasing) it unregisters every handler, so a
//! re-initialised session never receives duplicate deliveries.
//!
//! A failed handshake is not an error for the caller: the session degrades
//! to [`Context::NotEmbedded`] because running outside a host (a plain
//! browser tab) is an expected situation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::context::Context;
use super::error::HostError;
use super::events::{HostEvent, HostEventKind};
use super::shell::HostShell;

/// Default pause between `ready` and the embed probe.
pub const DEFAULT_READY_SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Initializing,
    Done,
}

/// Result of [`HostGateway::initialize`].
pub enum InitOutcome {
    /// This call performed the handshake.
    Started(HostSession),
    /// A handshake is already running or finished; nothing was done.
    AlreadyInitialized,
}

impl InitOutcome {
    pub fn into_session(self) -> Option<HostSession> {
        match self {
            InitOutcome::Started(session) => Some(session),
            InitOutcome::AlreadyInitialized => None,
        }
    }
}

/// Everything produced by one handshake.
pub struct HostSession {
    pub context: Context,
    /// Answer of the host's embed probe; `false` when the handshake failed.
    pub is_embedded: bool,
    /// Why the handshake degraded, if it did.
    pub failure: Option<HostError>,
    subscription: Option<HostSubscription>,
}

impl HostSession {
    fn degraded(error: HostError) -> Self {
        Self {
            context: Context::NotEmbedded,
            is_embedded: false,
            failure: Some(error),
            subscription: None,
        }
    }

    /// Take ownership of the event subscription. `None` after a failed
    /// handshake or when already taken.
    pub fn take_subscription(&mut self) -> Option<HostSubscription> {
        self.subscription.take()
    }
}

/// Owned registration on the host event channel.
pub struct HostSubscription {
    shell: Arc<dyn HostShell>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    released: bool,
}

impl HostSubscription {
    fn attach(shell: Arc<dyn HostShell>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();

        for kind in HostEventKind::ALL {
            let tx = tx.clone();
            shell.subscribe(
                kind,
                Box::new(move |event| {
                    if tx.send(event).is_err() {
                        debug!(event = %kind, "Host event arrived after subscription release");
                    }
                }),
            );
        }

        Self {
            shell,
            events,
            released: false,
        }
    }

    /// Wait for the next host event. Returns `None` once released and drained.
    pub async fn next_event(&mut self) -> Option<HostEvent> {
        self.events.recv().await
    }

    /// Next already-delivered event, without waiting.
    pub fn try_next_event(&mut self) -> Option<HostEvent> {
        self.events.try_recv().ok()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Unregister all handlers. Events already queued can still be drained.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.shell.unsubscribe_all();
        self.events.close();
        self.released = true;
        debug!("Host event subscription released");
    }
}

impl Drop for HostSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Puts the gateway back to `Uninitialized` if the handshake future is
/// dropped before it finishes, so a later mount can retry.
struct PhaseGuard<'a> {
    phase: &'a Mutex<Phase>,
    finished: bool,
}

impl PhaseGuard<'_> {
    fn finish(mut self) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = Phase::Done;
        self.finished = true;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = Phase::Uninitialized;
            debug!("Host handshake abandoned, gateway reset");
        }
    }
}

/// One-shot handshake driver.
pub struct HostGateway {
    shell: Arc<dyn HostShell>,
    ready_settle_delay: Duration,
    phase: Mutex<Phase>,
}

impl HostGateway {
    pub fn new(shell: Arc<dyn HostShell>) -> Self {
        Self {
            shell,
            ready_settle_delay: DEFAULT_READY_SETTLE_DELAY,
            phase: Mutex::new(Phase::Uninitialized),
        }
    }

    pub fn with_ready_settle_delay(mut self, delay: Duration) -> Self {
        self.ready_settle_delay = delay;
        self
    }

    pub fn shell(&self) -> &Arc<dyn HostShell> {
        &self.shell
    }

    /// Whether a handshake has started (or finished).
    pub fn is_initialized(&self) -> bool {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) != Phase::Uninitialized
    }

    /// Run the handshake once per gateway.
    ///
    /// Repeated calls, including calls made while the first handshake is
    /// still awaiting the host, return [`InitOutcome::AlreadyInitialized`]
    /// without touching the host. A handshake whose future is dropped
    /// midway does not count.
    pub async fn initialize(&self) -> InitOutcome {
        {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            if *phase != Phase::Uninitialized {
                debug!(phase = ?*phase, "Host gateway already initialized, skipping");
                return InitOutcome::AlreadyInitialized;
            }
            *phase = Phase::Initializing;
        }
        let guard = PhaseGuard {
            phase: &self.phase,
            finished: false,
        };

        let session = match self.handshake().await {
            Ok(session) => {
                info!(
                    embedded = session.is_embedded,
                    fid = ?session.context.fid(),
                    "Host handshake complete"
                );
                session
            }
            Err(e) => {
                warn!(error = %e, "Host handshake failed, continuing as not embedded");
                HostSession::degraded(e)
            }
        };

        guard.finish();
        InitOutcome::Started(session)
    }

    async fn handshake(&self) -> Result<HostSession, HostError> {
        let raw = self.shell.get_context().await?;
        let context = Context::parse(raw);
        if let Context::Unrecognized(raw) = &context {
            warn!(payload = %raw, "Host context payload not recognized");
        }

        self.shell.send_ready().await?;

        if !self.ready_settle_delay.is_zero() {
            tokio::time::sleep(self.ready_settle_delay).await;
        }
        let is_embedded = self.shell.is_in_mini_app().await;

        let subscription = HostSubscription::attach(Arc::clone(&self.shell));

        Ok(HostSession {
            context,
            is_embedded,
            failure: None,
            subscription: Some(subscription),
        })
    }
}
