//! Worker service: bus, controller and background tasks wired together.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use welcome_bus::MemorySignalBus;
use welcome_core::ValueType;

use crate::config::WorkerConfig;
use crate::controller::ScenarioController;
use crate::error::StartupError;
use crate::simulator::DoorSimulator;

/// A running scenario controller on the in-process bus.
pub struct WelcomeService {
    bus: Arc<MemorySignalBus>,
    controller: Arc<ScenarioController<MemorySignalBus>>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
    controller_handle: JoinHandle<()>,
    simulator_handle: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl WelcomeService {
    /// Build the scenario table, apply the baseline, subscribe, and spawn
    /// the controller loop (plus the door simulator when configured).
    pub async fn start(config: &WorkerConfig) -> Result<Self, StartupError> {
        let table = config.scenario_table()?;
        tracing::info!(
            trigger = %table.trigger(),
            scenarios = table.scenarios().count(),
            "Scenario table loaded",
        );

        let bus = Arc::new(MemorySignalBus::new(config.bus_capacity));
        let controller = Arc::new(ScenarioController::new(Arc::clone(&bus), table));
        let subscription = controller.on_start().await?;

        let cancel = CancellationToken::new();

        let controller_handle = {
            let controller = Arc::clone(&controller);
            let cancel = cancel.child_token();
            tokio::spawn(async move { controller.run(subscription, cancel).await })
        };

        let trigger = controller.table().trigger();
        let simulator_handle = match config.door_simulation_interval {
            Some(interval) if trigger.value_type() == ValueType::Bool => {
                let simulator = DoorSimulator::new(Arc::clone(&bus), trigger, interval);
                Some(tokio::spawn(simulator.run(cancel.child_token())))
            }
            Some(_) => {
                tracing::warn!(trigger = %trigger, "Door simulation needs a boolean trigger, not started");
                None
            }
            None => None,
        };

        Ok(Self {
            bus,
            controller,
            cancel,
            controller_handle,
            simulator_handle,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    pub fn bus(&self) -> &Arc<MemorySignalBus> {
        &self.bus
    }

    pub fn controller(&self) -> &Arc<ScenarioController<MemorySignalBus>> {
        &self.controller
    }

    /// Stop taking events, let an in-flight event finish, then discard the
    /// pending delayed stage.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down welcome service");
        self.cancel.cancel();

        if let Some(handle) = self.simulator_handle {
            if tokio::time::timeout(self.shutdown_timeout, handle).await.is_err() {
                tracing::warn!("Door simulator did not stop in time");
            }
        }

        if tokio::time::timeout(self.shutdown_timeout, self.controller_handle)
            .await
            .is_err()
        {
            tracing::warn!("Controller loop did not stop in time");
        }

        self.controller.shutdown().await;
        tracing::info!("Welcome service shut down");
    }
}
