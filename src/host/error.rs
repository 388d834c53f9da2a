// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host shell errors.

use crate::error::{Classify, FailureKind};

/// Errors raised across the host shell boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The context handshake failed or no host is present.
    #[error("Host handshake failed: {0}")]
    Handshake(String),

    /// The user dismissed the add-to-host prompt.
    #[error("{0}")]
    RejectedByUser(String),

    /// The host refused the add request because the domain manifest is invalid.
    #[error("{0}")]
    InvalidDomainManifest(String),

    /// Any other refusal by the host to perform a capability.
    #[error("{0}")]
    Capability(String),

    /// The message channel to the host failed.
    #[error("Host transport error: {0}")]
    Transport(String),
}

impl HostError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, HostError::RejectedByUser(_))
    }
}

impl Classify for HostError {
    fn kind(&self) -> FailureKind {
        match self {
            HostError::Handshake(_) => FailureKind::HandshakeFailure,
            HostError::RejectedByUser(_) => FailureKind::UserRejected,
            HostError::InvalidDomainManifest(_) | HostError::Capability(_) => {
                FailureKind::HostCapabilityError
            }
            HostError::Transport(_) => FailureKind::TransportError,
        }
    }
}
