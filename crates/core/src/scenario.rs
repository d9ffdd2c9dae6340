//! Scenarios and the validated trigger value → scenario table.
//!
//! A [`ScenarioTable`] can only be obtained through
//! [`ScenarioTableBuilder::build`], which enforces that the mapping is
//! total over the trigger's value type and that every batch is well
//! formed. Once built, [`ScenarioTable::resolve`] succeeds for every value
//! of the trigger's type.

use std::time::Duration;

use crate::batch::Batch;
use crate::error::ConfigurationError;
use crate::signals::SignalId;
use crate::value::{SignalValue, ValueType};

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Follow-up writes applied once the delay elapses uninterrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedStage {
    pub delay: Duration,
    pub batch: Batch,
}

/// The full response bound to one trigger value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    immediate: Batch,
    delayed: Option<DelayedStage>,
}

impl Scenario {
    /// A scenario with only an immediate stage.
    pub fn new(name: impl Into<String>, immediate: Batch) -> Self {
        Self {
            name: name.into(),
            immediate,
            delayed: None,
        }
    }

    /// Add a delayed stage applied `delay` after the immediate one.
    pub fn then_after(mut self, delay: Duration, batch: Batch) -> Self {
        self.delayed = Some(DelayedStage { delay, batch });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn immediate(&self) -> &Batch {
        &self.immediate
    }

    pub fn delayed(&self) -> Option<&DelayedStage> {
        self.delayed.as_ref()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        validate_batch(&self.name, &self.immediate)?;
        if let Some(stage) = &self.delayed {
            if stage.delay.is_zero() {
                return Err(ConfigurationError::ZeroDelay(self.name.clone()));
            }
            validate_batch(&format!("{} (delayed)", self.name), &stage.batch)?;
        }
        Ok(())
    }
}

fn validate_batch(context: &str, batch: &Batch) -> Result<(), ConfigurationError> {
    if let Some(signal) = batch.first_duplicate() {
        return Err(ConfigurationError::DuplicateSignal {
            batch: context.to_string(),
            signal: signal.to_string(),
        });
    }
    if let Some((signal, value)) = batch.first_type_mismatch() {
        return Err(ConfigurationError::TypeMismatch {
            context: context.to_string(),
            signal: signal.to_string(),
            expected: signal.value_type(),
            actual: value.value_type(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ScenarioTable
// ---------------------------------------------------------------------------

/// Validated, total mapping from trigger value to scenario.
#[derive(Debug, Clone)]
pub struct ScenarioTable {
    trigger: SignalId,
    baseline: Batch,
    entries: Vec<(SignalValue, Scenario)>,
    fallback: Option<Scenario>,
}

impl ScenarioTable {
    pub fn builder(trigger: SignalId) -> ScenarioTableBuilder {
        ScenarioTableBuilder {
            trigger,
            baseline: Batch::new(),
            entries: Vec::new(),
            fallback: None,
        }
    }

    pub fn trigger(&self) -> SignalId {
        self.trigger
    }

    /// Writes performed once when the controller starts.
    pub fn baseline(&self) -> &Batch {
        &self.baseline
    }

    /// The scenario answering `value`.
    ///
    /// Returns `None` only for values whose type differs from the
    /// trigger's; the table is total over the trigger's own type.
    pub fn resolve(&self, value: &SignalValue) -> Option<&Scenario> {
        if value.value_type() != self.trigger.value_type() {
            return None;
        }
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, scenario)| scenario)
            .or(self.fallback.as_ref())
    }

    /// All scenarios in definition order, fallback last.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.entries
            .iter()
            .map(|(_, scenario)| scenario)
            .chain(self.fallback.iter())
    }
}

/// Collects the parts of a [`ScenarioTable`] before validation.
#[derive(Debug, Clone)]
pub struct ScenarioTableBuilder {
    trigger: SignalId,
    baseline: Batch,
    entries: Vec<(SignalValue, Scenario)>,
    fallback: Option<Scenario>,
}

impl ScenarioTableBuilder {
    pub fn baseline(mut self, batch: Batch) -> Self {
        self.baseline = batch;
        self
    }

    /// Bind `scenario` to one trigger value.
    pub fn when(mut self, value: impl Into<SignalValue>, scenario: Scenario) -> Self {
        self.entries.push((value.into(), scenario));
        self
    }

    /// Bind `scenario` to every trigger value without an explicit entry.
    pub fn otherwise(mut self, scenario: Scenario) -> Self {
        self.fallback = Some(scenario);
        self
    }

    /// Validate and freeze the table.
    ///
    /// Rules:
    /// - The baseline and every scenario batch are free of duplicate
    ///   signals and type mismatches.
    /// - Delayed stages have a non-zero delay.
    /// - Entry values have the trigger's type and are unique.
    /// - Every value of the trigger's type is mapped: both booleans for a
    ///   boolean trigger, a fallback for integer and string triggers.
    pub fn build(self) -> Result<ScenarioTable, ConfigurationError> {
        validate_batch("baseline", &self.baseline)?;

        let trigger_type = self.trigger.value_type();

        for (i, (value, scenario)) in self.entries.iter().enumerate() {
            if value.value_type() != trigger_type {
                return Err(ConfigurationError::TypeMismatch {
                    context: scenario.name().to_string(),
                    signal: self.trigger.to_string(),
                    expected: trigger_type,
                    actual: value.value_type(),
                });
            }
            if let Some((_, earlier)) = self.entries[..i].iter().find(|(v, _)| v == value) {
                return Err(ConfigurationError::DuplicateScenario {
                    value: value.to_string(),
                    first: earlier.name().to_string(),
                    second: scenario.name().to_string(),
                });
            }
            scenario.validate()?;
        }

        if let Some(fallback) = &self.fallback {
            fallback.validate()?;
        } else {
            match trigger_type {
                ValueType::Bool => {
                    for b in [true, false] {
                        let value = SignalValue::Bool(b);
                        if !self.entries.iter().any(|(v, _)| *v == value) {
                            return Err(ConfigurationError::UnmappedTriggerValue {
                                trigger: self.trigger.to_string(),
                                value: value.to_string(),
                            });
                        }
                    }
                }
                ValueType::Int | ValueType::String => {
                    return Err(ConfigurationError::MissingFallback {
                        trigger: self.trigger.to_string(),
                        value_type: trigger_type,
                    });
                }
            }
        }

        Ok(ScenarioTable {
            trigger: self.trigger,
            baseline: self.baseline,
            entries: self.entries,
            fallback: self.fallback,
        })
    }
}
