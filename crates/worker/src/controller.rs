//! Scenario controller.
//!
//! [`ScenarioController`] turns trigger events into scenario runs. Each
//! event cancels whatever delayed stage is still pending, applies the
//! resolved scenario's immediate batch, and, if the scenario has one,
//! arms a timer task for its delayed batch (the *active sequence*).
//!
//! Event handling and a firing timer serialize on one mutex around the
//! active sequence slot. A timer that wakes up re-checks, under that
//! mutex, that it was not cancelled and is still the current sequence
//! before it writes anything, so a superseded delayed batch is never
//! applied. A timer that already started writing holds the mutex until
//! its batch completes, so the next event's immediate batch always lands
//! after it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use welcome_bus::{apply_batch, SignalBus, SignalEvent, Subscription};
use welcome_core::{DelayedStage, ScenarioTable, SignalValue};

use crate::error::{ControllerError, MalformedEventError, StartupError};

/// How long [`ScenarioController::shutdown`] waits for a timer task.
const SEQUENCE_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Public view of the pending delayed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    pub scenario: String,
    /// Increments with every sequence this controller arms.
    pub generation: u64,
}

struct ActiveSequence {
    info: SequenceInfo,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct SequenceSlot {
    generation: u64,
    active: Option<ActiveSequence>,
}

impl SequenceSlot {
    /// Cancel and detach the active sequence, if any.
    fn cancel_active(&mut self) -> Option<ActiveSequence> {
        let active = self.active.take()?;
        active.cancel.cancel();
        Some(active)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.info.generation == generation)
    }
}

/// Reacts to one trigger signal by running the scenarios of a
/// [`ScenarioTable`].
///
/// Lifecycle: [`new`](Self::new) → [`on_start`](Self::on_start) →
/// [`run`](Self::run) until cancelled → [`shutdown`](Self::shutdown).
pub struct ScenarioController<B: ?Sized> {
    bus: Arc<B>,
    table: ScenarioTable,
    slot: Arc<Mutex<SequenceSlot>>,
}

impl<B> ScenarioController<B>
where
    B: SignalBus + ?Sized + 'static,
{
    pub fn new(bus: Arc<B>, table: ScenarioTable) -> Self {
        Self {
            bus,
            table,
            slot: Arc::new(Mutex::new(SequenceSlot::default())),
        }
    }

    pub fn table(&self) -> &ScenarioTable {
        &self.table
    }

    /// Apply the baseline and subscribe to the trigger.
    ///
    /// Any failure here is fatal: the controller must not serve events
    /// from an unknown actuator state or without a subscription.
    pub async fn on_start(&self) -> Result<Subscription, StartupError> {
        let trigger = self.table.trigger();

        match self.bus.get(&trigger).await {
            Ok(current) => {
                tracing::info!(trigger = %trigger, current = ?current, "Trigger state at startup")
            }
            Err(e) => {
                tracing::warn!(trigger = %trigger, error = %e, "Could not read trigger state")
            }
        }

        let baseline = self.table.baseline();
        apply_batch(&*self.bus, baseline)
            .await
            .map_err(StartupError::Baseline)?;
        tracing::info!(writes = baseline.len(), "Baseline applied");

        let subscription = self
            .bus
            .subscribe(&trigger)
            .await
            .map_err(|source| StartupError::Subscribe {
                signal: trigger,
                source,
            })?;
        tracing::info!(trigger = %trigger, "Subscribed to trigger");

        Ok(subscription)
    }

    /// Handle one trigger event.
    ///
    /// An event without a usable trigger value returns before the active
    /// sequence is touched. Otherwise the pending delayed stage is
    /// cancelled first, then the value is resolved and the scenario run;
    /// if its immediate batch fails, no new sequence is armed.
    pub async fn on_trigger_event(&self, event: SignalEvent) -> Result<(), ControllerError> {
        let value = self.extract_value(event)?;

        let mut slot = self.slot.lock().await;

        if let Some(previous) = slot.cancel_active() {
            tracing::info!(
                scenario = %previous.info.scenario,
                generation = previous.info.generation,
                "Cancelled pending delayed stage",
            );
        }

        let scenario = self.table.resolve(&value).ok_or_else(|| {
            MalformedEventError::UnmappedValue {
                signal: self.table.trigger(),
                value: value.clone(),
            }
        })?;

        tracing::info!(scenario = scenario.name(), trigger = %value, "Running scenario");

        apply_batch(&*self.bus, scenario.immediate())
            .await
            .map_err(|source| ControllerError::BatchApply {
                scenario: scenario.name().to_string(),
                source,
            })?;

        if let Some(stage) = scenario.delayed() {
            slot.generation += 1;
            let info = SequenceInfo {
                scenario: scenario.name().to_string(),
                generation: slot.generation,
            };
            let cancel = CancellationToken::new();

            tracing::debug!(
                scenario = %info.scenario,
                generation = info.generation,
                delay = ?stage.delay,
                "Delayed stage armed",
            );

            let task = tokio::spawn(run_delayed_stage(
                Arc::clone(&self.bus),
                Arc::clone(&self.slot),
                stage.clone(),
                info.clone(),
                cancel.clone(),
            ));
            slot.active = Some(ActiveSequence { info, cancel, task });
        }

        Ok(())
    }

    /// Process trigger events in delivery order until `cancel` fires or
    /// the subscription ends.
    ///
    /// An event already being handled when `cancel` fires is finished
    /// first.
    pub async fn run(&self, mut subscription: Subscription, cancel: CancellationToken) {
        tracing::info!(trigger = %subscription.signal(), "Scenario controller started");

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scenario controller shutting down");
                    break;
                }
                event = subscription.next() => match event {
                    Some(event) => event,
                    None => {
                        tracing::warn!("Trigger subscription ended");
                        break;
                    }
                },
            };

            match self.on_trigger_event(event).await {
                Ok(()) => {}
                Err(ControllerError::MalformedEvent(e)) => {
                    tracing::warn!(error = %e, "Dropped malformed trigger event");
                }
                Err(ControllerError::BatchApply { scenario, source }) => {
                    tracing::error!(
                        scenario = %scenario,
                        rejected = ?source.rejected,
                        error = %source,
                        "Immediate stage failed, scenario abandoned",
                    );
                }
            }
        }
    }

    /// The pending delayed stage, if any.
    pub async fn active_sequence(&self) -> Option<SequenceInfo> {
        self.slot
            .lock()
            .await
            .active
            .as_ref()
            .map(|active| active.info.clone())
    }

    /// Cancel the pending delayed stage and wait for its timer to exit.
    ///
    /// A delayed batch already being written is allowed to finish.
    pub async fn shutdown(&self) {
        let active = self.slot.lock().await.cancel_active();

        if let Some(active) = active {
            tracing::info!(
                scenario = %active.info.scenario,
                "Discarding pending delayed stage on shutdown",
            );
            if tokio::time::timeout(SEQUENCE_SHUTDOWN_TIMEOUT, active.task)
                .await
                .is_err()
            {
                tracing::warn!("Delayed stage task did not exit in time");
            }
        }
    }

    fn extract_value(&self, event: SignalEvent) -> Result<SignalValue, MalformedEventError> {
        let trigger = self.table.trigger();

        if event.signal != trigger {
            return Err(MalformedEventError::UnexpectedSignal {
                expected: trigger,
                actual: event.signal,
            });
        }

        let value = event
            .value
            .ok_or(MalformedEventError::MissingValue { signal: trigger })?;

        if value.value_type() != trigger.value_type() {
            return Err(MalformedEventError::UnexpectedType {
                signal: trigger,
                expected: trigger.value_type(),
                actual: value.value_type(),
            });
        }

        Ok(value)
    }
}

/// Timer task of one active sequence.
async fn run_delayed_stage<B>(
    bus: Arc<B>,
    slot: Arc<Mutex<SequenceSlot>>,
    stage: DelayedStage,
    info: SequenceInfo,
    cancel: CancellationToken,
) where
    B: SignalBus + ?Sized,
{
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(scenario = %info.scenario, generation = info.generation, "Delayed stage cancelled");
            return;
        }
        _ = tokio::time::sleep(stage.delay) => {}
    }

    let mut slot = slot.lock().await;

    // Superseded while waiting for the lock.
    if cancel.is_cancelled() || !slot.is_current(info.generation) {
        tracing::debug!(scenario = %info.scenario, generation = info.generation, "Delayed stage superseded");
        return;
    }

    match apply_batch(&*bus, &stage.batch).await {
        Ok(()) => {
            tracing::info!(scenario = %info.scenario, generation = info.generation, "Delayed stage applied");
        }
        Err(e) => {
            tracing::error!(
                scenario = %info.scenario,
                generation = info.generation,
                rejected = ?e.rejected,
                error = %e,
                "Delayed stage failed",
            );
        }
    }

    slot.active = None;
}
