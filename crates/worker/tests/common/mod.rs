//! Shared helpers for the worker integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};
use welcome_bus::memory::AcceptedWrite;
use welcome_bus::{BusError, MemorySignalBus, SignalBus, Subscription};
use welcome_core::signals::DRIVER_DOOR_IS_OPEN;
use welcome_core::welcome::{passenger_welcome, WelcomeSettings};
use welcome_core::{ScenarioTable, SignalId, SignalValue};
use welcome_worker::ScenarioController;

pub fn welcome_table() -> ScenarioTable {
    passenger_welcome(&WelcomeSettings::default()).expect("built-in table is valid")
}

pub fn door(open: bool) -> welcome_bus::SignalEvent {
    welcome_bus::SignalEvent::new(DRIVER_DOOR_IS_OPEN, open)
}

pub fn controller() -> (Arc<MemorySignalBus>, ScenarioController<MemorySignalBus>) {
    let bus = Arc::new(MemorySignalBus::default());
    let controller = ScenarioController::new(Arc::clone(&bus), welcome_table());
    (bus, controller)
}

/// The immediate batch of the scenario bound to `value`.
pub fn immediate_of(table: &ScenarioTable, value: impl Into<SignalValue>) -> AcceptedWrite {
    table
        .resolve(&value.into())
        .expect("mapped value")
        .immediate()
        .entries()
        .to_vec()
}

/// The delayed batch of the scenario bound to `value`.
pub fn delayed_of(table: &ScenarioTable, value: impl Into<SignalValue>) -> AcceptedWrite {
    table
        .resolve(&value.into())
        .and_then(|scenario| scenario.delayed())
        .expect("scenario has a delayed stage")
        .batch
        .entries()
        .to_vec()
}

/// Accepted writes that touch anything but the door itself.
pub async fn actuator_writes(bus: &MemorySignalBus) -> Vec<AcceptedWrite> {
    bus.writes()
        .await
        .into_iter()
        .filter(|write| write.iter().all(|(signal, _)| *signal != DRIVER_DOOR_IS_OPEN))
        .collect()
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// GatedBus
// ---------------------------------------------------------------------------

/// A [`MemorySignalBus`] whose batched writes wait on a gate.
///
/// While a test holds the gate, every `set_many` blocks before reaching the
/// inner bus, which makes "write in flight" states observable.
pub struct GatedBus {
    pub inner: MemorySignalBus,
    gate: Semaphore,
    waiting: AtomicUsize,
}

impl GatedBus {
    pub fn new() -> Self {
        Self {
            inner: MemorySignalBus::default(),
            gate: Semaphore::new(1),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Block all writes until the returned permit is dropped.
    pub async fn hold(&self) -> SemaphorePermit<'_> {
        self.gate.acquire().await.expect("gate is never closed")
    }

    /// Number of writes currently blocked on the gate.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Yield until `n` writes are blocked on the gate.
    pub async fn wait_for_blocked(&self, n: usize) {
        while self.waiting() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl SignalBus for GatedBus {
    async fn get(&self, signal: &SignalId) -> Result<Option<SignalValue>, BusError> {
        self.inner.get(signal).await
    }

    async fn set(&self, signal: &SignalId, value: SignalValue) -> Result<(), BusError> {
        self.set_many(&[(*signal, value)]).await
    }

    async fn set_many(&self, writes: &[(SignalId, SignalValue)]) -> Result<(), BusError> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.expect("gate is never closed");
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        let result = self.inner.set_many(writes).await;
        drop(permit);
        result
    }

    async fn subscribe(&self, signal: &SignalId) -> Result<Subscription, BusError> {
        self.inner.subscribe(signal).await
    }
}
