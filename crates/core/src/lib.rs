//! Domain model for the passenger welcome scenario engine.
//!
//! Pure types and validation with zero internal dependencies and no I/O
//! beyond reading a scenario file:
//!
//! - [`signals`]: the catalog of known bus signals.
//! - [`value`]: typed signal values and the interior light modes.
//! - [`batch`]: ordered write batches.
//! - [`scenario`]: scenarios and the validated trigger → scenario table.
//! - [`welcome`]: the built-in passenger welcome table.
//! - [`scenario_file`]: JSON scenario tables resolved against the catalog.

pub mod batch;
pub mod error;
pub mod scenario;
pub mod scenario_file;
pub mod signals;
pub mod value;
pub mod welcome;

pub use batch::Batch;
pub use error::ConfigurationError;
pub use scenario::{DelayedStage, Scenario, ScenarioTable, ScenarioTableBuilder};
pub use signals::SignalId;
pub use value::{LightMode, SignalValue, ValueType};
