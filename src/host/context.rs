// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Host Context Model
//!
//! The host shell hands over an untyped JSON payload during the handshake.
//! [`Context::parse`] decides once whether that payload is a usable
//! [`HostContext`]; every other module works with the tagged result and
//! never probes raw properties itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Push-notification grant issued by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDetails {
    /// Host endpoint that accepts notifications for this user.
    pub url: String,
    /// Per-user token for that endpoint.
    pub token: String,
}

/// Platform the host is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    Web,
    Mobile,
}

/// Screen insets the UI should keep clear of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeAreaInsets {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Identity of the user running the mini-app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostUser {
    pub fid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfp_url: Option<String>,
}

/// Description of the embedding client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostClient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<PlatformType>,
    #[serde(default)]
    pub client_fid: u64,
    #[serde(default)]
    pub added: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_area_insets: Option<SafeAreaInsets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_details: Option<NotificationDetails>,
}

/// Immutable snapshot produced once per session by the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostContext {
    pub user: HostUser,
    #[serde(default)]
    pub client: HostClient,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
}

/// Outcome of interpreting the handshake payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Payload matched the host context shape.
    Valid(HostContext),
    /// Host answered, but with something we do not understand. Kept verbatim
    /// for diagnostics.
    Unrecognized(Value),
    /// No host answered (plain browser, or the handshake failed).
    NotEmbedded,
}

impl Context {
    /// Validate a raw handshake payload.
    ///
    /// A payload is accepted when it is an object whose `user.fid` is an
    /// unsigned integer and the rest deserializes cleanly.
    pub fn parse(raw: Value) -> Self {
        let has_fid = raw
            .get("user")
            .and_then(|user| user.get("fid"))
            .is_some_and(Value::is_u64);

        if !has_fid {
            return Context::Unrecognized(raw);
        }

        match serde_json::from_value::<HostContext>(raw.clone()) {
            Ok(context) => Context::Valid(context),
            Err(e) => {
                tracing::debug!(error = %e, "Host context payload did not match expected shape");
                Context::Unrecognized(raw)
            }
        }
    }

    pub fn host_context(&self) -> Option<&HostContext> {
        match self {
            Context::Valid(context) => Some(context),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&HostUser> {
        self.host_context().map(|c| &c.user)
    }

    pub fn client(&self) -> Option<&HostClient> {
        self.host_context().map(|c| &c.client)
    }

    pub fn fid(&self) -> Option<u64> {
        self.user().map(|u| u.fid)
    }

    /// `client.added` at handshake time; `false` when there is no context.
    pub fn initially_added(&self) -> bool {
        self.client().is_some_and(|c| c.added)
    }

    /// Grant already held at handshake time, if any.
    pub fn initial_notification_details(&self) -> Option<NotificationDetails> {
        self.client().and_then(|c| c.notification_details.clone())
    }

    pub fn safe_area_insets(&self) -> SafeAreaInsets {
        self.client()
            .and_then(|c| c.safe_area_insets)
            .unwrap_or_default()
    }

    /// Raw JSON view, as it would be shown in a debug panel.
    pub fn to_json(&self) -> Value {
        match self {
            Context::Valid(context) => serde_json::to_value(context).unwrap_or(Value::Null),
            Context::Unrecognized(raw) => raw.clone(),
            Context::NotEmbedded => Value::Null,
        }
    }
}
