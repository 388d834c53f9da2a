// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host shell integration.
//!
//! This module provides:
//! - The typed host context and its validating parse
//! - The one-time handshake and the owned event subscription
//! - The capability bridge that folds host events into session state

pub mod bridge;
pub mod context;
pub mod error;
pub mod events;
pub mod gateway;
pub mod shell;

pub use bridge::{BridgePhase, CapabilityBridge, CapabilityState};
pub use context::{Context, HostClient, HostContext, HostUser, NotificationDetails};
pub use error::HostError;
pub use events::{HostEvent, HostEventKind};
pub use gateway::{HostGateway, HostSession, HostSubscription, InitOutcome};
pub use shell::{AddFrameResult, ComposeCast, EventHandler, HostShell, PrimaryButton, SignInResult};
