//! Startup, run loop and service lifecycle tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use welcome_bus::{BusError, MemorySignalBus, SignalBus, SignalEvent};
use welcome_core::signals::{DRIVER_DOOR_IS_OPEN, DRIVER_SEAT_POSITION, LOW_BEAM_IS_ON};
use welcome_core::{ConfigurationError, SignalValue};
use welcome_worker::{ScenarioController, StartupError, WelcomeService, WorkerConfig};

use common::{actuator_writes, controller, delayed_of, immediate_of, settle, welcome_table};

fn baseline() -> Vec<(welcome_core::SignalId, SignalValue)> {
    vec![(DRIVER_SEAT_POSITION, SignalValue::Int(0))]
}

// ---------------------------------------------------------------------------
// Test: on_start applies the baseline before subscribing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn on_start_applies_baseline_and_subscribes() {
    let (bus, controller) = controller();

    let subscription = controller.on_start().await.expect("started");

    assert_eq!(subscription.signal(), DRIVER_DOOR_IS_OPEN);
    assert_eq!(bus.writes().await, vec![baseline()]);
    assert_eq!(controller.active_sequence().await, None);
}

#[tokio::test]
async fn on_start_fails_when_baseline_is_rejected() {
    let (bus, controller) = controller();
    bus.reject(DRIVER_SEAT_POSITION, "seat motor fault").await;

    let err = controller.on_start().await.err().expect("startup fails");

    assert_matches!(
        err,
        StartupError::Baseline(e) if e.rejected_signals() == vec![DRIVER_SEAT_POSITION]
    );
}

#[tokio::test]
async fn on_start_fails_when_trigger_cannot_be_subscribed() {
    let bus = Arc::new(MemorySignalBus::with_signals(16, &[DRIVER_SEAT_POSITION]));
    let controller = ScenarioController::new(Arc::clone(&bus), welcome_table());

    let err = controller.on_start().await.err().expect("startup fails");

    assert_matches!(
        err,
        StartupError::Subscribe { signal, source: BusError::UnknownSignal(_) }
            if signal == DRIVER_DOOR_IS_OPEN
    );
    // Baseline still went out first.
    assert_eq!(bus.writes().await, vec![baseline()]);
}

// ---------------------------------------------------------------------------
// Test: run() handles door events in order until cancelled
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn run_processes_door_events_in_order() {
    let table = welcome_table();
    let (bus, controller) = controller();
    let controller = Arc::new(controller);

    let subscription = controller.on_start().await.expect("started");
    let cancel = CancellationToken::new();
    let handle = {
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        tokio::spawn(async move { controller.run(subscription, cancel).await })
    };

    bus.set(&DRIVER_DOOR_IS_OPEN, true.into()).await.expect("accepted");
    settle().await;
    bus.set(&DRIVER_DOOR_IS_OPEN, false.into()).await.expect("accepted");
    settle().await;

    sleep(Duration::from_millis(2_001)).await;
    settle().await;

    assert_eq!(
        actuator_writes(&bus).await,
        vec![
            baseline(),
            immediate_of(&table, true),
            immediate_of(&table, false),
            delayed_of(&table, false),
        ]
    );

    cancel.cancel();
    handle.await.expect("run loop exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn run_skips_malformed_events() {
    let table = welcome_table();
    let (bus, controller) = controller();
    let controller = Arc::new(controller);

    let subscription = controller.on_start().await.expect("started");
    let cancel = CancellationToken::new();
    let handle = {
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        tokio::spawn(async move { controller.run(subscription, cancel).await })
    };

    bus.publish(SignalEvent::without_value(DRIVER_DOOR_IS_OPEN)).await;
    bus.publish(SignalEvent::new(DRIVER_DOOR_IS_OPEN, "open")).await;
    bus.set(&DRIVER_DOOR_IS_OPEN, true.into()).await.expect("accepted");
    settle().await;

    assert_eq!(
        actuator_writes(&bus).await,
        vec![baseline(), immediate_of(&table, true)]
    );

    cancel.cancel();
    handle.await.expect("run loop exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn queued_door_events_survive_the_controllers_own_writes() {
    let table = welcome_table();
    let bus = Arc::new(MemorySignalBus::new(16));
    let controller = Arc::new(ScenarioController::new(Arc::clone(&bus), welcome_table()));

    let subscription = controller.on_start().await.expect("started");

    // Ten door events fit the door channel, but not once every handled
    // event adds five or six actuator writes to a shared buffer.
    let door_values: Vec<bool> = (0..10).map(|i| i % 2 == 0).collect();
    for open in &door_values {
        bus.publish(SignalEvent::new(DRIVER_DOOR_IS_OPEN, *open)).await;
    }

    let cancel = CancellationToken::new();
    let handle = {
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        tokio::spawn(async move { controller.run(subscription, cancel).await })
    };
    sleep(Duration::from_millis(1)).await;

    let mut expected = vec![baseline()];
    expected.extend(door_values.iter().map(|open| immediate_of(&table, *open)));
    assert_eq!(actuator_writes(&bus).await, expected);

    cancel.cancel();
    handle.await.expect("run loop exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn retained_door_state_is_handled_on_start() {
    let table = welcome_table();
    let (bus, controller) = controller();
    let controller = Arc::new(controller);
    bus.set(&DRIVER_DOOR_IS_OPEN, true.into()).await.expect("accepted");

    let subscription = controller.on_start().await.expect("started");
    let cancel = CancellationToken::new();
    let handle = {
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        tokio::spawn(async move { controller.run(subscription, cancel).await })
    };
    settle().await;

    assert_eq!(
        actuator_writes(&bus).await,
        vec![baseline(), immediate_of(&table, true)]
    );

    cancel.cancel();
    handle.await.expect("run loop exits cleanly");
}

// ---------------------------------------------------------------------------
// Test: WelcomeService wires config, bus, controller and simulator
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn service_runs_simulated_door_cycle() {
    let config = WorkerConfig {
        lights_off_delay: Duration::from_millis(500),
        door_simulation_interval: Some(Duration::from_secs(1)),
        ..WorkerConfig::default()
    };
    let table = config.scenario_table().expect("built-in table");

    let service = WelcomeService::start(&config).await.expect("started");
    assert_eq!(actuator_writes(service.bus()).await, vec![baseline()]);

    // Door opens at 1s, closes at 2s, lights go off at 2.5s.
    sleep(Duration::from_millis(2_600)).await;
    settle().await;

    assert_eq!(
        actuator_writes(service.bus()).await,
        vec![
            baseline(),
            immediate_of(&table, true),
            immediate_of(&table, false),
            delayed_of(&table, false),
        ]
    );

    let bus = Arc::clone(service.bus());
    service.shutdown().await;

    let writes_at_shutdown = bus.writes().await.len();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(bus.writes().await.len(), writes_at_shutdown);
}

#[tokio::test(start_paused = true)]
async fn service_shutdown_discards_pending_lights_off() {
    let service = WelcomeService::start(&WorkerConfig::default())
        .await
        .expect("started");
    let bus = Arc::clone(service.bus());

    bus.set(&DRIVER_DOOR_IS_OPEN, true.into()).await.expect("accepted");
    settle().await;
    bus.set(&DRIVER_DOOR_IS_OPEN, false.into()).await.expect("accepted");
    settle().await;
    assert!(service.controller().active_sequence().await.is_some());

    service.shutdown().await;
    sleep(Duration::from_secs(5)).await;

    assert_eq!(
        bus.get(&LOW_BEAM_IS_ON).await.expect("known"),
        Some(SignalValue::Bool(true))
    );
}

#[tokio::test]
async fn service_start_fails_on_missing_scenario_file() {
    let config = WorkerConfig {
        scenario_file: Some("/nonexistent/welcome.json".into()),
        ..WorkerConfig::default()
    };

    let err = WelcomeService::start(&config)
        .await
        .err()
        .expect("startup fails");

    assert_matches!(
        err,
        StartupError::Configuration(ConfigurationError::InvalidFile(_))
    );
}
