use crate::value::ValueType;

/// A scenario table or process configuration that cannot be served.
///
/// Every variant is fatal at startup: the process does not begin
/// processing trigger events.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Trigger value {value} of {trigger} has no scenario")]
    UnmappedTriggerValue { trigger: String, value: String },

    #[error("Trigger {trigger} of type {value_type} requires a fallback scenario")]
    MissingFallback {
        trigger: String,
        value_type: ValueType,
    },

    #[error("Scenarios '{first}' and '{second}' both answer trigger value {value}")]
    DuplicateScenario {
        value: String,
        first: String,
        second: String,
    },

    #[error("Batch '{batch}' writes {signal} more than once")]
    DuplicateSignal { batch: String, signal: String },

    #[error("{context}: {signal} expects {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        signal: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Unknown signal path: {0}")]
    UnknownSignal(String),

    #[error("Scenario '{0}' has a delayed stage with a zero delay")]
    ZeroDelay(String),

    #[error("Invalid scenario file: {0}")]
    InvalidFile(String),

    #[error("Environment variable {var} has invalid value '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}
