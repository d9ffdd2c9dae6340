//! Door simulator for local runs without a real door provider.
//!
//! Flips a boolean trigger signal on a fixed interval, which drives the
//! controller through alternating open and close scenarios.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use welcome_bus::{BusError, SignalBus};
use welcome_core::{SignalId, SignalValue};

pub struct DoorSimulator<B: ?Sized> {
    bus: Arc<B>,
    door: SignalId,
    interval: Duration,
}

impl<B> DoorSimulator<B>
where
    B: SignalBus + ?Sized,
{
    pub fn new(bus: Arc<B>, door: SignalId, interval: Duration) -> Self {
        Self {
            bus,
            door,
            interval,
        }
    }

    /// Toggle the door every interval until cancelled. The first toggle
    /// happens one interval after the call.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            door = %self.door,
            interval = ?self.interval,
            "Door simulator started",
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Door simulator shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.toggle().await {
                        Ok(open) => tracing::debug!(open, "Door toggled"),
                        Err(e) => tracing::warn!(door = %self.door, error = %e, "Door toggle failed"),
                    }
                }
            }
        }
    }

    /// Write the negation of the door's current value. An unset door
    /// counts as closed. Returns the new state.
    pub async fn toggle(&self) -> Result<bool, BusError> {
        let current = self
            .bus
            .get(&self.door)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        let next = !current;
        self.bus.set(&self.door, SignalValue::Bool(next)).await?;
        Ok(next)
    }
}
