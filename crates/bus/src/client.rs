//! The signal bus client contract.

use std::fmt;

use async_trait::async_trait;
use welcome_core::{SignalId, SignalValue};

use crate::event::Subscription;

/// One write the broker refused, with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub signal: SignalId,
    pub reason: String,
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.signal, self.reason)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    #[error("Unknown signal: {0}")]
    UnknownSignal(SignalId),

    /// The broker refused the request; nothing was written.
    #[error("{} of {total} writes rejected", entries.len())]
    Rejected {
        total: usize,
        entries: Vec<RejectedEntry>,
    },

    #[error("Bus connection error: {0}")]
    Connection(String),
}

/// Client of a vehicle signal broker.
///
/// Implementations must deliver updates of a single signal to each
/// subscription in the order they were accepted, and must apply
/// [`set_many`](SignalBus::set_many) all-or-nothing.
#[async_trait]
pub trait SignalBus: Send + Sync {
    /// Current value of `signal`, `None` if it has never been written.
    async fn get(&self, signal: &SignalId) -> Result<Option<SignalValue>, BusError>;

    /// Write a single value.
    async fn set(&self, signal: &SignalId, value: SignalValue) -> Result<(), BusError>;

    /// Write every entry, in order, as one atomic request.
    async fn set_many(&self, writes: &[(SignalId, SignalValue)]) -> Result<(), BusError>;

    /// Subscribe to updates of `signal`.
    async fn subscribe(&self, signal: &SignalId) -> Result<Subscription, BusError>;
}
