// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet errors and their rendering policy.
//!
//! A user rejection renders as a fixed, non-alarming line. Every other
//! failure renders its raw message. Callers must go through
//! [`WalletError::render`] so the two paths stay distinguishable.

use crate::error::{Classify, FailureKind};

/// Rendering used for every user rejection.
pub const REJECTED_BY_USER: &str = "Rejected by user.";

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Chain {0} is not supported")]
    UnsupportedChain(u64),

    #[error("{0}")]
    Signer(String),

    #[error("{0}")]
    Transport(String),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("No wallet connector available")]
    NoConnector,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out waiting for receipt of {0}")]
    ReceiptTimeout(String),

    #[error("Wallet controller has been torn down")]
    Closed,
}

impl WalletError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::UserRejected(_))
    }

    /// One-line text for display.
    pub fn render(&self) -> String {
        if self.is_user_rejection() {
            REJECTED_BY_USER.to_string()
        } else {
            self.to_string()
        }
    }
}

impl Classify for WalletError {
    fn kind(&self) -> FailureKind {
        match self {
            WalletError::UserRejected(_) => FailureKind::UserRejected,
            WalletError::UnsupportedChain(_)
            | WalletError::Signer(_)
            | WalletError::NotConnected
            | WalletError::NoConnector => FailureKind::SignerError,
            WalletError::InvalidInput(_) => FailureKind::InvalidInput,
            WalletError::Transport(_) | WalletError::ReceiptTimeout(_) | WalletError::Closed => {
                FailureKind::TransportError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_renders_distinctly() {
        let rejected = WalletError::UserRejected("User denied message signature.".into());
        let failed = WalletError::Signer("User denied message signature.".into());

        assert_eq!(rejected.render(), REJECTED_BY_USER);
        assert_eq!(failed.render(), "User denied message signature.");
        assert_ne!(rejected.render(), failed.render());
        assert_eq!(rejected.kind(), FailureKind::UserRejected);
        assert_eq!(failed.kind(), FailureKind::SignerError);
    }

    #[test]
    fn other_errors_render_raw_message() {
        assert_eq!(
            WalletError::UnsupportedChain(1).render(),
            "Chain 1 is not supported"
        );
        assert_eq!(
            WalletError::Transport("connection reset".into()).render(),
            "connection reset"
        );
        assert_eq!(WalletError::NotConnected.render(), "Wallet is not connected");
    }

    #[test]
    fn no_other_variant_renders_as_rejection() {
        let others = [
            WalletError::UnsupportedChain(5),
            WalletError::Signer("x".into()),
            WalletError::Transport("x".into()),
            WalletError::NotConnected,
            WalletError::NoConnector,
            WalletError::InvalidInput("x".into()),
            WalletError::ReceiptTimeout("0xabc".into()),
            WalletError::Closed,
        ];
        for error in others {
            assert_ne!(error.render(), REJECTED_BY_USER, "{error:?}");
            assert_ne!(error.kind(), FailureKind::UserRejected);
        }
    }
}
