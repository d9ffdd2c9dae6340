//! JSON scenario tables.
//!
//! Replaces the built-in table when the worker is pointed at a file.
//! Signal paths are resolved against the [`signals`](crate::signals)
//! catalog and values are checked against each signal's type, so a file
//! that parses always yields a fully validated [`ScenarioTable`].
//!
//! ```json
//! {
//!   "trigger": "Vehicle.Cabin.Door.Row1.Left.IsOpen",
//!   "baseline": [{ "signal": "Vehicle.Cabin.Seat.Row1.Pos1.Position", "value": 0 }],
//!   "scenarios": [
//!     { "name": "door-opened", "when": true,
//!       "immediate": [{ "signal": "Vehicle.Body.Lights.Beam.Low.IsOn", "value": true }] },
//!     { "name": "door-closed", "when": false,
//!       "immediate": [{ "signal": "Vehicle.Cabin.Seat.Row1.Pos1.Position", "value": 500 }],
//!       "delayed": { "after_ms": 2000,
//!                    "writes": [{ "signal": "Vehicle.Body.Lights.Beam.Low.IsOn", "value": false }] } }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::batch::Batch;
use crate::error::ConfigurationError;
use crate::scenario::{Scenario, ScenarioTable};
use crate::signals::{self, SignalId};
use crate::value::SignalValue;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableSpec {
    trigger: String,
    #[serde(default)]
    baseline: Vec<WriteSpec>,
    scenarios: Vec<ScenarioSpec>,
    #[serde(default)]
    otherwise: Option<FallbackSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteSpec {
    signal: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioSpec {
    name: String,
    when: serde_json::Value,
    immediate: Vec<WriteSpec>,
    #[serde(default)]
    delayed: Option<DelayedSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FallbackSpec {
    name: String,
    immediate: Vec<WriteSpec>,
    #[serde(default)]
    delayed: Option<DelayedSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DelayedSpec {
    after_ms: u64,
    writes: Vec<WriteSpec>,
}

/// Read and resolve a scenario table from a JSON file.
pub fn load(path: &Path) -> Result<ScenarioTable, ConfigurationError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ConfigurationError::InvalidFile(format!("cannot read {}: {e}", path.display()))
    })?;
    parse(&raw)
}

/// Resolve a scenario table from its JSON text.
pub fn parse(raw: &str) -> Result<ScenarioTable, ConfigurationError> {
    let spec: TableSpec =
        serde_json::from_str(raw).map_err(|e| ConfigurationError::InvalidFile(e.to_string()))?;

    let trigger = resolve_signal(&spec.trigger)?;
    let mut builder =
        ScenarioTable::builder(trigger).baseline(resolve_writes("baseline", &spec.baseline)?);

    for scenario in &spec.scenarios {
        let when = convert_value(&scenario.name, trigger, &scenario.when)?;
        let resolved = resolve_scenario(
            &scenario.name,
            &scenario.immediate,
            scenario.delayed.as_ref(),
        )?;
        builder = builder.when(when, resolved);
    }

    if let Some(fallback) = &spec.otherwise {
        builder = builder.otherwise(resolve_scenario(
            &fallback.name,
            &fallback.immediate,
            fallback.delayed.as_ref(),
        )?);
    }

    builder.build()
}

fn resolve_scenario(
    name: &str,
    immediate: &[WriteSpec],
    delayed: Option<&DelayedSpec>,
) -> Result<Scenario, ConfigurationError> {
    let mut scenario = Scenario::new(name, resolve_writes(name, immediate)?);
    if let Some(stage) = delayed {
        scenario = scenario.then_after(
            Duration::from_millis(stage.after_ms),
            resolve_writes(name, &stage.writes)?,
        );
    }
    Ok(scenario)
}

fn resolve_writes(context: &str, writes: &[WriteSpec]) -> Result<Batch, ConfigurationError> {
    writes.iter().try_fold(Batch::new(), |batch, write| {
        let signal = resolve_signal(&write.signal)?;
        let value = convert_value(context, signal, &write.value)?;
        Ok(batch.add(signal, value))
    })
}

fn resolve_signal(path: &str) -> Result<SignalId, ConfigurationError> {
    signals::lookup(path).ok_or_else(|| ConfigurationError::UnknownSignal(path.to_string()))
}

/// Convert a JSON value into the signal's declared type.
fn convert_value(
    context: &str,
    signal: SignalId,
    value: &serde_json::Value,
) -> Result<SignalValue, ConfigurationError> {
    let converted = match value {
        serde_json::Value::Bool(b) => SignalValue::Bool(*b),
        serde_json::Value::String(s) => SignalValue::String(s.clone()),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => SignalValue::Int(i),
            None => {
                return Err(ConfigurationError::InvalidFile(format!(
                    "{context}: {signal} value {n} is not an integer"
                )))
            }
        },
        other => {
            return Err(ConfigurationError::InvalidFile(format!(
                "{context}: {signal} value {other} is not a bool, integer or string"
            )))
        }
    };

    if converted.value_type() != signal.value_type() {
        return Err(ConfigurationError::TypeMismatch {
            context: context.to_string(),
            signal: signal.to_string(),
            expected: signal.value_type(),
            actual: converted.value_type(),
        });
    }
    Ok(converted)
}
