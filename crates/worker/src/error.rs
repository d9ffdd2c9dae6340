use welcome_bus::{BatchApplyError, BusError};
use welcome_core::{ConfigurationError, SignalId, SignalValue, ValueType};

/// A trigger event the controller cannot act on. The event is dropped.
#[derive(Debug, thiserror::Error)]
pub enum MalformedEventError {
    #[error("Event for {signal} carries no value")]
    MissingValue { signal: SignalId },

    #[error("Event for {actual} delivered to the {expected} controller")]
    UnexpectedSignal {
        expected: SignalId,
        actual: SignalId,
    },

    #[error("Event for {signal} carries a {actual} value, expected {expected}")]
    UnexpectedType {
        signal: SignalId,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("No scenario answers {signal} = {value}")]
    UnmappedValue { signal: SignalId, value: SignalValue },
}

/// Failure while handling a single trigger event.
///
/// Neither variant stops the controller; the next event is handled
/// normally.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    MalformedEvent(#[from] MalformedEventError),

    #[error("Scenario '{scenario}' immediate stage failed: {source}")]
    BatchApply {
        scenario: String,
        #[source]
        source: BatchApplyError,
    },
}

/// Fatal failure before the controller begins serving events.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Baseline write failed: {0}")]
    Baseline(#[source] BatchApplyError),

    #[error("Subscription to {signal} failed: {source}")]
    Subscribe {
        signal: SignalId,
        #[source]
        source: BusError,
    },
}
