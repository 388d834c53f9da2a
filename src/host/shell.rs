// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host shell boundary.
//!
//! [`HostShell`] is everything the mini-app can ask of the embedding host:
//! the context handshake, the event channel, and the user-facing actions.
//! The transport behind it (postMessage, a native bridge, a test double) is
//! not this crate's concern.
//!
//! An adapter that receives raw `(name, payload)` messages decodes them
//! with [`HostEvent::from_wire`] before calling the registered handler:
//!
//! ```rust,ignore
//! fn on_message(&self, name: &str, payload: &serde_json::Value) {
//!     match HostEvent::from_wire(name, payload) {
//!         Ok(event) => self.deliver(event),
//!         Err(e) => tracing::warn!(error = %e, "Dropping host message"),
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::NotificationDetails;
use super::error::HostError;
use super::events::{HostEvent, HostEventKind};

/// Callback registered for one host event kind.
pub type EventHandler = Box<dyn Fn(HostEvent) + Send + Sync>;

/// Draft post handed to the host composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeCast {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<String>,
}

/// Host-rendered primary button configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryButton {
    pub text: String,
    pub loading: bool,
    pub disabled: bool,
    pub hidden: bool,
}

impl PrimaryButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            loading: false,
            disabled: false,
            hidden: false,
        }
    }
}

/// Successful answer to an add-to-host request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFrameResult {
    #[serde(default)]
    pub notification_details: Option<NotificationDetails>,
}

/// Signed sign-in message returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResult {
    pub message: String,
    pub signature: String,
}

/// Capabilities exposed by the embedding host.
#[async_trait]
pub trait HostShell: Send + Sync {
    /// Fetch the raw context payload. Fails when no host is listening.
    async fn get_context(&self) -> Result<Value, HostError>;

    /// Tell the host the app finished loading. The host may hold back
    /// further interaction until this arrives.
    async fn send_ready(&self) -> Result<(), HostError>;

    /// Whether the app is actually running inside a host.
    async fn is_in_mini_app(&self) -> bool;

    /// Register `handler` for events of `kind`.
    fn subscribe(&self, kind: HostEventKind, handler: EventHandler);

    /// Drop every registered handler.
    fn unsubscribe_all(&self);

    async fn open_url(&self, url: &str) -> Result<(), HostError>;

    async fn compose_cast(&self, cast: &ComposeCast) -> Result<(), HostError>;

    async fn view_profile(&self, fid: u64) -> Result<(), HostError>;

    async fn view_cast(&self, hash: &str, close: bool) -> Result<(), HostError>;

    async fn set_primary_button(&self, button: &PrimaryButton) -> Result<(), HostError>;

    async fn close(&self) -> Result<(), HostError>;

    /// Ask the user to add this app to the host.
    async fn add_frame(&self) -> Result<AddFrameResult, HostError>;

    async fn sign_in(&self, nonce: &str) -> Result<SignInResult, HostError>;
}
