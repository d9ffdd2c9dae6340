//! Well-known vehicle signal identifiers.
//!
//! Paths follow the Vehicle Signal Specification tree exposed by the
//! vehicle data broker. These must match the paths the broker was
//! provisioned with; the scenario file loader resolves paths through
//! [`lookup`].

use std::fmt;

use serde::Serialize;

use crate::value::ValueType;

/// Opaque handle to one point on the signal bus.
///
/// Identity is the path; the value type is what the bus expects to
/// receive for that path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SignalId {
    path: &'static str,
    value_type: ValueType,
}

impl SignalId {
    pub const fn new(path: &'static str, value_type: ValueType) -> Self {
        Self { path, value_type }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// Driver door open state. The trigger of the passenger welcome scenarios.
pub const DRIVER_DOOR_IS_OPEN: SignalId =
    SignalId::new("Vehicle.Cabin.Door.Row1.Left.IsOpen", ValueType::Bool);

/// Driver seat fore/aft position in millimetres from the rearmost position.
pub const DRIVER_SEAT_POSITION: SignalId =
    SignalId::new("Vehicle.Cabin.Seat.Row1.Pos1.Position", ValueType::Int);

/// Interior light animation mode, see [`LightMode`](crate::value::LightMode).
pub const INTERIOR_LIGHT_MODE: SignalId =
    SignalId::new("Vehicle.Cabin.Lights.InteriorLight.Mode", ValueType::String);

pub const INTERIOR_LIGHT_RED: SignalId =
    SignalId::new("Vehicle.Cabin.Lights.InteriorLight.Red", ValueType::Int);

pub const INTERIOR_LIGHT_GREEN: SignalId =
    SignalId::new("Vehicle.Cabin.Lights.InteriorLight.Green", ValueType::Int);

pub const INTERIOR_LIGHT_BLUE: SignalId =
    SignalId::new("Vehicle.Cabin.Lights.InteriorLight.Blue", ValueType::Int);

/// Exterior low beam.
pub const LOW_BEAM_IS_ON: SignalId =
    SignalId::new("Vehicle.Body.Lights.Beam.Low.IsOn", ValueType::Bool);

/// Every signal the engine knows about.
pub const CATALOG: &[SignalId] = &[
    DRIVER_DOOR_IS_OPEN,
    DRIVER_SEAT_POSITION,
    INTERIOR_LIGHT_MODE,
    INTERIOR_LIGHT_RED,
    INTERIOR_LIGHT_GREEN,
    INTERIOR_LIGHT_BLUE,
    LOW_BEAM_IS_ON,
];

/// Resolve a signal path to its identifier.
pub fn lookup(path: &str) -> Option<SignalId> {
    CATALOG.iter().copied().find(|s| s.path == path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_paths_are_unique() {
        let paths: HashSet<_> = CATALOG.iter().map(|s| s.path()).collect();
        assert_eq!(paths.len(), CATALOG.len());
    }

    #[test]
    fn lookup_resolves_known_paths() {
        assert_eq!(
            lookup("Vehicle.Body.Lights.Beam.Low.IsOn"),
            Some(LOW_BEAM_IS_ON)
        );
        assert_eq!(lookup("Vehicle.Body.Lights.Beam.High.IsOn"), None);
    }
}
