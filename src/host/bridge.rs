// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Capability Event Bridge
//!
//! Folds host-pushed events into a single [`CapabilityState`]:
//! "is the app added", "which notification grant is live", and "what was
//! the last thing the host told us".
//!
//! ## Ownership
//!
//! The bridge is the only writer of this state. Readers (UI, dispatcher,
//! wallet views) hold a `watch::Receiver` and never mutate it. Each event is
//! applied in one `send_modify` call, so an event's effect is never
//! partially visible.
//!
//! ## Event effects
//!
//! | Event | added | notification details |
//! |-------|-------|-----------------------|
//! | added(details?) | `true` | replaced when details are present |
//! | add-rejected | unchanged | unchanged |
//! | removed | `false` | cleared |
//! | notifications-enabled(details) | unchanged | replaced |
//! | notifications-disabled | unchanged | cleared |
//! | primary-button-clicked | unchanged | unchanged |
//!
//! Every event overwrites `last_event`. Effects are authoritative at the
//! time an event is received: an `added` carrying details that arrives
//! after a `notifications-disabled` re-enables notifications.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::context::{Context, NotificationDetails};
use super::events::HostEvent;
use super::gateway::{HostSession, HostSubscription};

/// Lifecycle of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    /// No successful handshake yet.
    Uninitialized,
    /// Handshake done, host events are folded into the state.
    Ready,
    /// Torn down; late writes are discarded.
    Closed,
}

/// Reconciled view of the host capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityState {
    pub phase: BridgePhase,
    pub context: Context,
    pub is_embedded: bool,
    pub added: bool,
    pub notification_details: Option<NotificationDetails>,
    /// Label of the most recent host event, empty before the first one.
    pub last_event: String,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl Default for CapabilityState {
    fn default() -> Self {
        Self {
            phase: BridgePhase::Uninitialized,
            context: Context::NotEmbedded,
            is_embedded: false,
            added: false,
            notification_details: None,
            last_event: String::new(),
            last_event_at: None,
        }
    }
}

impl CapabilityState {
    /// Apply one host event. Pure state transition, no phase checks.
    pub fn fold(&mut self, event: &HostEvent) {
        match event {
            HostEvent::Added {
                notification_details,
            } => {
                self.added = true;
                if let Some(details) = notification_details {
                    self.notification_details = Some(details.clone());
                }
            }
            HostEvent::AddRejected { .. } => {}
            HostEvent::Removed => {
                self.added = false;
                self.notification_details = None;
            }
            HostEvent::NotificationsEnabled {
                notification_details,
            } => {
                self.notification_details = Some(notification_details.clone());
            }
            HostEvent::NotificationsDisabled => {
                self.notification_details = None;
            }
            HostEvent::PrimaryButtonClicked => {}
        }
        self.last_event = event.label();
        self.last_event_at = Some(Utc::now());
    }

    pub fn is_ready(&self) -> bool {
        self.phase == BridgePhase::Ready
    }

    /// Whether a notification can be sent right now.
    pub fn can_notify(&self) -> bool {
        self.notification_details.is_some() && self.context.fid().is_some()
    }
}

/// Single writer of [`CapabilityState`]. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CapabilityBridge {
    state: Arc<watch::Sender<CapabilityState>>,
}

impl Default for CapabilityBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityBridge {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CapabilityState::default());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Read-only view that is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<CapabilityState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CapabilityState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> BridgePhase {
        self.state.borrow().phase
    }

    /// Uninitialized → Ready. Seeds `added` and the notification grant from
    /// the handshake context. Returns `false` if not in `Uninitialized`.
    pub fn mark_ready(&self, context: Context, is_embedded: bool) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase != BridgePhase::Uninitialized {
                return false;
            }
            state.phase = BridgePhase::Ready;
            state.added = context.initially_added();
            state.notification_details = context.initial_notification_details();
            state.context = context;
            state.is_embedded = is_embedded;
            true
        })
    }

    /// Adopt a handshake result. On success the bridge becomes ready and the
    /// event subscription is handed back for [`CapabilityBridge::run`]; a
    /// degraded session leaves the bridge uninitialized.
    pub fn attach(&self, session: &mut HostSession) -> Option<HostSubscription> {
        if session.failure.is_some() {
            self.state.send_if_modified(|state| {
                if state.phase != BridgePhase::Uninitialized {
                    return false;
                }
                state.context = session.context.clone();
                state.is_embedded = false;
                true
            });
            return None;
        }

        if !self.mark_ready(session.context.clone(), session.is_embedded) {
            warn!("Capability bridge already attached, ignoring new session");
            return None;
        }
        session.take_subscription()
    }

    /// Fold one host event into the state. Ignored unless ready.
    pub fn apply(&self, event: &HostEvent) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if state.phase != BridgePhase::Ready {
                return false;
            }
            state.fold(event);
            true
        });

        if applied {
            debug!(event = %event.kind(), label = %event.label(), "Host event applied");
        } else {
            warn!(event = %event.kind(), phase = ?self.phase(), "Host event ignored");
        }
        applied
    }

    /// Drop the current grant, e.g. before asking the host for a fresh one.
    pub fn clear_notification_details(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase != BridgePhase::Ready {
                return false;
            }
            state.notification_details = None;
            true
        })
    }

    /// Store a grant returned directly by an add-to-host call.
    pub fn grant_notifications(&self, details: NotificationDetails) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase != BridgePhase::Ready {
                return false;
            }
            state.notification_details = Some(details);
            true
        })
    }

    /// Stop accepting writes. Irreversible.
    pub fn close(&self) {
        self.state.send_if_modified(|state| {
            if state.phase == BridgePhase::Closed {
                return false;
            }
            state.phase = BridgePhase::Closed;
            true
        });
    }

    /// Apply host events until the stream ends or `shutdown` fires, then
    /// release the subscription and close the bridge.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn({ let bridge = bridge.clone(); async move { bridge.run(subscription, shutdown).await } });
    /// ```
    pub async fn run(&self, mut subscription: HostSubscription, shutdown: CancellationToken) {
        info!("Capability bridge listening for host events");

        loop {
            tokio::select! {
                event = subscription.next_event() => match event {
                    Some(event) => {
                        self.apply(&event);
                    }
                    None => {
                        info!("Host event stream ended");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    info!("Capability bridge shutting down");
                    break;
                }
            }
        }

        subscription.release();
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::gateway::HostGateway;
    use crate::testing::MockShell;
    use serde_json::json;
    use std::time::Duration;

    fn details(url: &str, token: &str) -> NotificationDetails {
        NotificationDetails {
            url: url.to_string(),
            token: token.to_string(),
        }
    }

    fn context(added: bool, details: Option<NotificationDetails>) -> Context {
        let mut client = json!({ "clientFid": 9152, "added": added });
        if let Some(d) = details {
            client["notificationDetails"] = json!({ "url": d.url, "token": d.token });
        }
        Context::parse(json!({ "user": { "fid": 6841 }, "client": client }))
    }

    fn ready_bridge(added: bool) -> CapabilityBridge {
        let bridge = CapabilityBridge::new();
        assert!(bridge.mark_ready(context(added, None), true));
        bridge
    }

    #[test]
    fn starts_uninitialized_and_ignores_events() {
        let bridge = CapabilityBridge::new();
        assert_eq!(bridge.phase(), BridgePhase::Uninitialized);
        assert!(!bridge.apply(&HostEvent::Removed));
        assert_eq!(bridge.snapshot().last_event, "");
    }

    #[test]
    fn mark_ready_seeds_from_context_once() {
        let bridge = CapabilityBridge::new();
        let grant = details("https://x/n", "t0");
        assert!(bridge.mark_ready(context(true, Some(grant.clone())), true));

        let state = bridge.snapshot();
        assert!(state.is_ready());
        assert!(state.added);
        assert_eq!(state.notification_details, Some(grant));
        assert!(state.can_notify());

        assert!(!bridge.mark_ready(context(false, None), false));
        assert!(bridge.snapshot().added);
    }

    #[test]
    fn added_without_details() {
        let bridge = ready_bridge(false);
        bridge.apply(&HostEvent::Added {
            notification_details: None,
        });

        let state = bridge.snapshot();
        assert!(state.added);
        assert_eq!(state.notification_details, None);
        assert_eq!(state.last_event, "added");
        assert!(state.last_event_at.is_some());
    }

    #[test]
    fn added_with_details() {
        let bridge = ready_bridge(false);
        bridge.apply(&HostEvent::Added {
            notification_details: Some(details("https://x/n", "t1")),
        });

        let state = bridge.snapshot();
        assert!(state.added);
        assert_eq!(
            state.notification_details,
            Some(details("https://x/n", "t1"))
        );
        assert_eq!(state.last_event, "added, notifications enabled");
    }

    #[test]
    fn added_without_details_keeps_existing_grant() {
        let bridge = ready_bridge(true);
        bridge.apply(&HostEvent::NotificationsEnabled {
            notification_details: details("https://x/n", "t1"),
        });
        bridge.apply(&HostEvent::Added {
            notification_details: None,
        });
        assert_eq!(
            bridge.snapshot().notification_details,
            Some(details("https://x/n", "t1"))
        );
    }

    #[test]
    fn add_rejected_changes_only_last_event() {
        let bridge = ready_bridge(true);
        bridge.apply(&HostEvent::AddRejected {
            reason: "rejected_by_user".into(),
        });

        let state = bridge.snapshot();
        assert!(state.added);
        assert_eq!(state.last_event, "add-rejected: rejected_by_user");
    }

    #[test]
    fn removed_clears_added_and_grant() {
        let bridge = ready_bridge(true);
        bridge.apply(&HostEvent::NotificationsEnabled {
            notification_details: details("https://x/n", "t1"),
        });
        bridge.apply(&HostEvent::Removed);

        let state = bridge.snapshot();
        assert!(!state.added);
        assert!(state.notification_details.is_none());
        assert_eq!(state.last_event, "removed");
    }

    #[test]
    fn notifications_toggle() {
        let bridge = ready_bridge(true);
        bridge.apply(&HostEvent::NotificationsEnabled {
            notification_details: details("https://x/n", "t2"),
        });
        assert_eq!(bridge.snapshot().last_event, "notifications-enabled");
        assert!(bridge.snapshot().notification_details.is_some());

        bridge.apply(&HostEvent::NotificationsDisabled);
        let state = bridge.snapshot();
        assert!(state.notification_details.is_none());
        assert!(state.added);
        assert_eq!(state.last_event, "notifications-disabled");
    }

    #[test]
    fn primary_button_is_observational() {
        let bridge = ready_bridge(true);
        let before = bridge.snapshot();
        bridge.apply(&HostEvent::PrimaryButtonClicked);
        let after = bridge.snapshot();

        assert_eq!(after.added, before.added);
        assert_eq!(after.notification_details, before.notification_details);
        assert_eq!(after.last_event, "primary-button-clicked");
    }

    /// Known limitation: delivery order is trusted. An `added` with details
    /// that the host emits after `notifications-disabled` re-grants.
    #[test]
    fn last_event_wins_for_out_of_order_grant() {
        let bridge = ready_bridge(true);
        bridge.apply(&HostEvent::NotificationsDisabled);
        bridge.apply(&HostEvent::Added {
            notification_details: Some(details("https://x/n", "stale")),
        });
        assert_eq!(
            bridge.snapshot().notification_details,
            Some(details("https://x/n", "stale"))
        );
    }

    #[test]
    fn added_tracks_most_recent_added_or_removed() {
        // Deterministic walk over mixed sequences.
        let events = [
            HostEvent::Added {
                notification_details: None,
            },
            HostEvent::AddRejected { reason: "r".into() },
            HostEvent::Removed,
            HostEvent::NotificationsEnabled {
                notification_details: details("u", "t"),
            },
            HostEvent::NotificationsDisabled,
            HostEvent::PrimaryButtonClicked,
        ];

        for seed in 0u64..200 {
            let initial = seed % 2 == 0;
            let bridge = ready_bridge(initial);
            let mut expected_added = initial;
            let mut expected_grant: Option<NotificationDetails> = None;
            let mut x = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);

            for _ in 0..12 {
                x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let event = &events[(x >> 33) as usize % events.len()];
                match event {
                    HostEvent::Added { .. } => expected_added = true,
                    HostEvent::Removed => {
                        expected_added = false;
                        expected_grant = None;
                    }
                    HostEvent::NotificationsEnabled {
                        notification_details,
                    } => expected_grant = Some(notification_details.clone()),
                    HostEvent::NotificationsDisabled => expected_grant = None,
                    _ => {}
                }
                bridge.apply(event);

                let state = bridge.snapshot();
                assert_eq!(state.added, expected_added, "seed {seed}");
                assert_eq!(state.notification_details, expected_grant, "seed {seed}");
            }
        }
    }

    #[test]
    fn writes_after_close_are_discarded() {
        let bridge = ready_bridge(true);
        bridge.close();

        assert!(!bridge.apply(&HostEvent::Removed));
        assert!(!bridge.grant_notifications(details("u", "t")));
        assert!(bridge.snapshot().added);
        assert_eq!(bridge.phase(), BridgePhase::Closed);
    }

    #[test]
    fn clear_and_grant_require_ready() {
        let bridge = CapabilityBridge::new();
        assert!(!bridge.grant_notifications(details("u", "t")));
        assert!(!bridge.clear_notification_details());

        let bridge = ready_bridge(true);
        assert!(bridge.grant_notifications(details("u", "t")));
        assert!(bridge.clear_notification_details());
        assert!(bridge.snapshot().notification_details.is_none());
    }

    #[tokio::test]
    async fn degraded_session_leaves_bridge_uninitialized() {
        let shell = Arc::new(MockShell::absent());
        let gateway = HostGateway::new(shell).with_ready_settle_delay(Duration::ZERO);
        let mut session = gateway.initialize().await.into_session().unwrap();

        let bridge = CapabilityBridge::new();
        assert!(bridge.attach(&mut session).is_none());
        assert_eq!(bridge.phase(), BridgePhase::Uninitialized);
        assert_eq!(bridge.snapshot().context, Context::NotEmbedded);
    }

    #[tokio::test]
    async fn run_applies_host_events_and_releases_on_shutdown() {
        let shell = Arc::new(MockShell::embedded(json!({
            "user": { "fid": 6841 },
            "client": { "clientFid": 9152, "added": false }
        })));
        let gateway = HostGateway::new(shell.clone()).with_ready_settle_delay(Duration::ZERO);
        let mut session = gateway.initialize().await.into_session().unwrap();

        let bridge = CapabilityBridge::new();
        let subscription = bridge.attach(&mut session).unwrap();
        let mut view = bridge.subscribe();

        let shutdown = CancellationToken::new();
        let task = tokio::spawn({
            let bridge = bridge.clone();
            let shutdown = shutdown.clone();
            async move { bridge.run(subscription, shutdown).await }
        });

        shell.emit(HostEvent::Added {
            notification_details: Some(details("https://x/n", "t1")),
        });
        view.wait_for(|state| state.added).await.unwrap();
        assert_eq!(
            view.borrow().notification_details,
            Some(details("https://x/n", "t1"))
        );

        shutdown.cancel();
        task.await.unwrap();

        assert_eq!(shell.handler_count(), 0);
        assert_eq!(bridge.phase(), BridgePhase::Closed);
    }
}
