// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tri-state projection of one asynchronous action.
//!
//! Each action (sign, send, switch chain, add to host, send notification)
//! owns its own [`PendingOperation`]. Starting an action hands out a
//! [`Ticket`]; only the holder of the most recent ticket may settle the
//! operation, so a result that arrives after a reset or a newer start is
//! dropped instead of overwriting fresher state.

/// Observable state of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState<T, E> {
    Idle,
    Pending,
    Settled(Result<T, E>),
}

/// Proof that the caller started the current run of an operation.
#[must_use = "a ticket is required to settle the operation"]
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Generic pending/error/result holder reused by every async action.
#[derive(Debug, Clone)]
pub struct PendingOperation<T, E> {
    state: OperationState<T, E>,
    generation: u64,
}

impl<T, E> Default for PendingOperation<T, E> {
    fn default() -> Self {
        Self {
            state: OperationState::Idle,
            generation: 0,
        }
    }
}

impl<T, E> PendingOperation<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the operation in flight, discarding any previous result.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = OperationState::Pending;
        Ticket(self.generation)
    }

    /// Record the outcome of the run identified by `ticket`.
    ///
    /// Returns `false` (and leaves the state untouched) when the ticket is
    /// stale, i.e. the operation was reset or restarted meanwhile.
    pub fn settle(&mut self, ticket: Ticket, result: Result<T, E>) -> bool {
        if ticket.0 != self.generation || !self.is_pending() {
            return false;
        }
        self.state = OperationState::Settled(result);
        true
    }

    /// Return to idle. Any run still in flight can no longer settle.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = OperationState::Idle;
    }

    pub fn state(&self) -> &OperationState<T, E> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, OperationState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, OperationState::Pending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, OperationState::Settled(_))
    }

    /// Successful result, if settled with one.
    pub fn data(&self) -> Option<&T> {
        match &self.state {
            OperationState::Settled(Ok(value)) => Some(value),
            _ => None,
        }
    }

    /// Failure, if settled with one.
    pub fn error(&self) -> Option<&E> {
        match &self.state {
            OperationState::Settled(Err(err)) => Some(err),
            _ => None,
        }
    }
}
