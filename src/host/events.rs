// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host-pushed events.
//!
//! The host emits a fixed set of named events. [`HostEventKind`] is that set,
//! [`HostEvent`] is one delivered occurrence with its typed payload.

use serde::Deserialize;
use serde_json::Value;

use super::context::NotificationDetails;
use super::error::HostError;

/// The fixed set of events the bridge subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    Added,
    AddRejected,
    Removed,
    NotificationsEnabled,
    NotificationsDisabled,
    PrimaryButtonClicked,
}

impl HostEventKind {
    pub const ALL: [HostEventKind; 6] = [
        HostEventKind::Added,
        HostEventKind::AddRejected,
        HostEventKind::Removed,
        HostEventKind::NotificationsEnabled,
        HostEventKind::NotificationsDisabled,
        HostEventKind::PrimaryButtonClicked,
    ];

    /// Event name used on the host message channel.
    pub fn wire_name(&self) -> &'static str {
        match self {
            HostEventKind::Added => "frameAdded",
            HostEventKind::AddRejected => "frameAddRejected",
            HostEventKind::Removed => "frameRemoved",
            HostEventKind::NotificationsEnabled => "notificationsEnabled",
            HostEventKind::NotificationsDisabled => "notificationsDisabled",
            HostEventKind::PrimaryButtonClicked => "primaryButtonClicked",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_name() == name)
    }
}

impl std::fmt::Display for HostEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Added {
        notification_details: Option<NotificationDetails>,
    },
    AddRejected {
        reason: String,
    },
    Removed,
    NotificationsEnabled {
        notification_details: NotificationDetails,
    },
    NotificationsDisabled,
    PrimaryButtonClicked,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddedPayload {
    #[serde(default)]
    notification_details: Option<NotificationDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsEnabledPayload {
    notification_details: NotificationDetails,
}

#[derive(Deserialize)]
struct AddRejectedPayload {
    reason: String,
}

impl HostEvent {
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::Added { .. } => HostEventKind::Added,
            HostEvent::AddRejected { .. } => HostEventKind::AddRejected,
            HostEvent::Removed => HostEventKind::Removed,
            HostEvent::NotificationsEnabled { .. } => HostEventKind::NotificationsEnabled,
            HostEvent::NotificationsDisabled => HostEventKind::NotificationsDisabled,
            HostEvent::PrimaryButtonClicked => HostEventKind::PrimaryButtonClicked,
        }
    }

    /// Human-readable description stored as the last host event.
    pub fn label(&self) -> String {
        match self {
            HostEvent::Added {
                notification_details: Some(_),
            } => "added, notifications enabled".to_string(),
            HostEvent::Added {
                notification_details: None,
            } => "added".to_string(),
            HostEvent::AddRejected { reason } => format!("add-rejected: {reason}"),
            HostEvent::Removed => "removed".to_string(),
            HostEvent::NotificationsEnabled { .. } => "notifications-enabled".to_string(),
            HostEvent::NotificationsDisabled => "notifications-disabled".to_string(),
            HostEvent::PrimaryButtonClicked => "primary-button-clicked".to_string(),
        }
    }

    /// Decode an event delivered under its wire name, e.g. `frameAdded`.
    pub fn from_wire(name: &str, payload: &Value) -> Result<Self, HostError> {
        let kind = HostEventKind::from_wire_name(name)
            .ok_or_else(|| HostError::Transport(format!("unknown host event {name:?}")))?;
        Self::from_payload(kind, payload)
    }

    /// Decode an event from its wire kind and JSON payload.
    pub fn from_payload(kind: HostEventKind, payload: &Value) -> Result<Self, HostError> {
        let decode_err =
            |e: serde_json::Error| HostError::Transport(format!("invalid {kind} payload: {e}"));

        let event = match kind {
            HostEventKind::Added => {
                let payload = if payload.is_null() {
                    AddedPayload {
                        notification_details: None,
                    }
                } else {
                    AddedPayload::deserialize(payload).map_err(decode_err)?
                };
                HostEvent::Added {
                    notification_details: payload.notification_details,
                }
            }
            HostEventKind::AddRejected => {
                let payload = AddRejectedPayload::deserialize(payload).map_err(decode_err)?;
                HostEvent::AddRejected {
                    reason: payload.reason,
                }
            }
            HostEventKind::Removed => HostEvent::Removed,
            HostEventKind::NotificationsEnabled => {
                let payload =
                    NotificationsEnabledPayload::deserialize(payload).map_err(decode_err)?;
                HostEvent::NotificationsEnabled {
                    notification_details: payload.notification_details,
                }
            }
            HostEventKind::NotificationsDisabled => HostEvent::NotificationsDisabled,
            HostEventKind::PrimaryButtonClicked => HostEvent::PrimaryButtonClicked,
        };
        Ok(event)
    }
}
