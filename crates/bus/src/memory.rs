//! In-process signal broker backed by `tokio::sync::broadcast` channels.
//!
//! [`MemorySignalBus`] keeps the current value of every known signal,
//! applies batched writes all-or-nothing, and fans every accepted write
//! out to the subscribers of that signal. Each signal has its own channel,
//! so traffic on one signal never evicts unread updates of another. It records each accepted request so callers can
//! inspect exactly what was written and in which grouping, and it can be
//! told to refuse writes to individual signals to exercise failure paths.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use welcome_core::signals::CATALOG;
use welcome_core::{SignalId, SignalValue};

use crate::client::{BusError, RejectedEntry, SignalBus};
use crate::event::{SignalEvent, Subscription};

/// Default buffer capacity of each signal's broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A write request accepted by the bus, in submission order.
pub type AcceptedWrite = Vec<(SignalId, SignalValue)>;

#[derive(Default)]
struct BusState {
    values: HashMap<SignalId, SignalValue>,
    rejections: HashMap<SignalId, String>,
    accepted: Vec<AcceptedWrite>,
}

/// In-process broker for a fixed set of signals.
///
/// # Usage
///
/// ```rust
/// use welcome_bus::{MemorySignalBus, SignalBus};
/// use welcome_core::signals::DRIVER_DOOR_IS_OPEN;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bus = MemorySignalBus::default();
/// let mut door = bus.subscribe(&DRIVER_DOOR_IS_OPEN).await.unwrap();
///
/// bus.set(&DRIVER_DOOR_IS_OPEN, true.into()).await.unwrap();
/// assert_eq!(door.next().await.unwrap().value, Some(true.into()));
/// # }
/// ```
pub struct MemorySignalBus {
    senders: HashMap<SignalId, broadcast::Sender<SignalEvent>>,
    state: Mutex<BusState>,
}

impl MemorySignalBus {
    /// A bus serving the full signal catalog.
    ///
    /// `capacity` bounds each signal's buffer. When it is full, the oldest
    /// undelivered updates of that signal are dropped and slow
    /// subscriptions log a lag warning.
    ///
    /// # Panics
    ///
    /// Like `tokio::sync::broadcast::channel`, if `capacity` is zero or
    /// larger than `usize::MAX / 2`.
    pub fn new(capacity: usize) -> Self {
        Self::with_signals(capacity, CATALOG)
    }

    /// A bus serving only `signals`; anything else is an unknown signal.
    pub fn with_signals(capacity: usize, signals: &[SignalId]) -> Self {
        let senders = signals
            .iter()
            .map(|signal| (*signal, broadcast::channel(capacity).0))
            .collect();
        Self {
            senders,
            state: Mutex::new(BusState::default()),
        }
    }

    /// Refuse every later write to `signal` with `reason`.
    pub async fn reject(&self, signal: SignalId, reason: impl Into<String>) {
        self.state
            .lock()
            .await
            .rejections
            .insert(signal, reason.into());
    }

    /// Accept writes to `signal` again.
    pub async fn accept(&self, signal: SignalId) {
        self.state.lock().await.rejections.remove(&signal);
    }

    /// Every accepted write request so far, oldest first.
    pub async fn writes(&self) -> Vec<AcceptedWrite> {
        self.state.lock().await.accepted.clone()
    }

    /// Deliver `event` to subscribers as if a provider had published it.
    ///
    /// The event is not validated, so it may lack a value or carry one of
    /// the wrong type. A present value becomes the signal's current value.
    pub async fn publish(&self, event: SignalEvent) {
        let mut state = self.state.lock().await;
        if let Some(value) = &event.value {
            state.values.insert(event.signal, value.clone());
        }
        if let Some(sender) = self.senders.get(&event.signal) {
            // Ignore the SendError: it only means there are zero subscribers.
            let _ = sender.send(event);
        }
    }

    fn ensure_known(&self, signal: &SignalId) -> Result<(), BusError> {
        if self.senders.contains_key(signal) {
            Ok(())
        } else {
            Err(BusError::UnknownSignal(*signal))
        }
    }

    fn check_write(
        &self,
        state: &BusState,
        signal: &SignalId,
        value: &SignalValue,
    ) -> Option<RejectedEntry> {
        let reason = if !self.senders.contains_key(signal) {
            "unknown signal".to_string()
        } else if signal.value_type() != value.value_type() {
            format!(
                "expected {} value, got {}",
                signal.value_type(),
                value.value_type()
            )
        } else if let Some(reason) = state.rejections.get(signal) {
            reason.clone()
        } else {
            return None;
        };
        Some(RejectedEntry {
            signal: *signal,
            reason,
        })
    }
}

impl Default for MemorySignalBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl SignalBus for MemorySignalBus {
    async fn get(&self, signal: &SignalId) -> Result<Option<SignalValue>, BusError> {
        self.ensure_known(signal)?;
        Ok(self.state.lock().await.values.get(signal).cloned())
    }

    async fn set(&self, signal: &SignalId, value: SignalValue) -> Result<(), BusError> {
        self.set_many(&[(*signal, value)]).await
    }

    async fn set_many(&self, writes: &[(SignalId, SignalValue)]) -> Result<(), BusError> {
        let mut state = self.state.lock().await;

        let rejected: Vec<RejectedEntry> = writes
            .iter()
            .filter_map(|(signal, value)| self.check_write(&state, signal, value))
            .collect();
        if !rejected.is_empty() {
            return Err(BusError::Rejected {
                total: writes.len(),
                entries: rejected,
            });
        }

        for (signal, value) in writes {
            state.values.insert(*signal, value.clone());
            if let Some(sender) = self.senders.get(signal) {
                let _ = sender.send(SignalEvent::new(*signal, value.clone()));
            }
        }
        state.accepted.push(writes.to_vec());
        Ok(())
    }

    async fn subscribe(&self, signal: &SignalId) -> Result<Subscription, BusError> {
        let sender = self
            .senders
            .get(signal)
            .ok_or(BusError::UnknownSignal(*signal))?;

        // Snapshot and subscribe under the lock so no write falls between.
        let state = self.state.lock().await;
        let retained = state
            .values
            .get(signal)
            .map(|value| SignalEvent::new(*signal, value.clone()));
        let receiver = sender.subscribe();
        Ok(Subscription::new(*signal, retained, receiver))
    }
}
