//! The built-in passenger welcome scenarios.
//!
//! Opening the driver door moves the seat back for easy entry, starts the
//! green night-rider animation and turns the low beam on. Closing it moves
//! the seat to the driving position and plays a red rainbow, then switches
//! the interior light and low beam off once the lights-off delay elapses.

use std::time::Duration;

use crate::batch::Batch;
use crate::error::ConfigurationError;
use crate::scenario::{Scenario, ScenarioTable};
use crate::signals::{
    DRIVER_DOOR_IS_OPEN, DRIVER_SEAT_POSITION, INTERIOR_LIGHT_BLUE, INTERIOR_LIGHT_GREEN,
    INTERIOR_LIGHT_MODE, INTERIOR_LIGHT_RED, LOW_BEAM_IS_ON,
};
use crate::value::LightMode;

/// Seat position written once on start.
pub const BASELINE_SEAT_POSITION: i64 = 0;

/// Seat position while the door is open.
pub const ENTRY_SEAT_POSITION: i64 = 1000;

/// Seat position after the door closes.
pub const DRIVING_SEAT_POSITION: i64 = 500;

/// Default delay between the door closing and the lights going off.
pub const DEFAULT_LIGHTS_OFF_DELAY: Duration = Duration::from_secs(2);

pub const DOOR_OPENED_SCENARIO: &str = "door-opened";
pub const DOOR_CLOSED_SCENARIO: &str = "door-closed";

/// Tunables of the built-in table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeSettings {
    pub lights_off_delay: Duration,
}

impl Default for WelcomeSettings {
    fn default() -> Self {
        Self {
            lights_off_delay: DEFAULT_LIGHTS_OFF_DELAY,
        }
    }
}

/// Build and validate the passenger welcome table.
pub fn passenger_welcome(settings: &WelcomeSettings) -> Result<ScenarioTable, ConfigurationError> {
    let door_opened = Scenario::new(
        DOOR_OPENED_SCENARIO,
        Batch::new()
            .add(DRIVER_SEAT_POSITION, ENTRY_SEAT_POSITION)
            .add(INTERIOR_LIGHT_MODE, LightMode::NightRider)
            .add(INTERIOR_LIGHT_RED, 0)
            .add(INTERIOR_LIGHT_GREEN, 255)
            .add(INTERIOR_LIGHT_BLUE, 0)
            .add(LOW_BEAM_IS_ON, true),
    );

    let door_closed = Scenario::new(
        DOOR_CLOSED_SCENARIO,
        Batch::new()
            .add(DRIVER_SEAT_POSITION, DRIVING_SEAT_POSITION)
            .add(INTERIOR_LIGHT_MODE, LightMode::Rainbow)
            .add(INTERIOR_LIGHT_RED, 255)
            .add(INTERIOR_LIGHT_GREEN, 0)
            .add(INTERIOR_LIGHT_BLUE, 0),
    )
    .then_after(
        settings.lights_off_delay,
        Batch::new()
            .add(INTERIOR_LIGHT_MODE, LightMode::Off)
            .add(LOW_BEAM_IS_ON, false),
    );

    ScenarioTable::builder(DRIVER_DOOR_IS_OPEN)
        .baseline(Batch::new().add(DRIVER_SEAT_POSITION, BASELINE_SEAT_POSITION))
        .when(true, door_opened)
        .when(false, door_closed)
        .build()
}
