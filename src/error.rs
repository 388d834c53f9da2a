// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Failure Taxonomy
//!
//! Every subsystem error maps onto one [`FailureKind`]. The kind decides how
//! a failure is rendered and whether it affects the session or only the
//! action that raised it:
//!
//! | Kind | Scope | Rendering |
//! |------|-------|-----------|
//! | `HandshakeFailure` | session, degrades to "not embedded" | never shown as an action result |
//! | `UserRejected` | action | distinct, non-alarming |
//! | `HostCapabilityError` | action | host message |
//! | `SignerError` / `TransportError` | action | raw message |
//! | `RateLimited` | action, retryable by the user | `Rate limited` |
//! | `RelayError` | action | response body |
//! | `InvalidInput` | action | raw message |

use serde::Serialize;

/// Classification shared by all error types in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    HandshakeFailure,
    UserRejected,
    HostCapabilityError,
    SignerError,
    TransportError,
    RateLimited,
    RelayError,
    InvalidInput,
}

impl FailureKind {
    /// Stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::HandshakeFailure => "handshake_failure",
            FailureKind::UserRejected => "user_rejected",
            FailureKind::HostCapabilityError => "host_capability_error",
            FailureKind::SignerError => "signer_error",
            FailureKind::TransportError => "transport_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::RelayError => "relay_error",
            FailureKind::InvalidInput => "invalid_input",
        }
    }

    /// Whether the failure is an expected user decision rather than a fault.
    pub fn is_expected(&self) -> bool {
        matches!(self, FailureKind::UserRejected | FailureKind::RateLimited)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Implemented by every error type so callers can branch on the taxonomy
/// without matching concrete variants.
pub trait Classify {
    fn kind(&self) -> FailureKind;
}
