//! Ordered write batches.

use std::collections::HashSet;

use crate::signals::SignalId;
use crate::value::SignalValue;

/// An ordered list of signal writes submitted to the bus as one unit.
///
/// Built fluently:
///
/// ```rust
/// use welcome_core::batch::Batch;
/// use welcome_core::signals::{DRIVER_SEAT_POSITION, LOW_BEAM_IS_ON};
///
/// let batch = Batch::new()
///     .add(DRIVER_SEAT_POSITION, 1000)
///     .add(LOW_BEAM_IS_ON, true);
/// assert_eq!(batch.len(), 2);
/// ```
///
/// `add` never rejects a repeated signal; scenario validation does, via
/// [`Batch::first_duplicate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<(SignalId, SignalValue)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write, keeping insertion order.
    pub fn add(mut self, signal: SignalId, value: impl Into<SignalValue>) -> Self {
        self.entries.push((signal, value.into()));
        self
    }

    pub fn entries(&self) -> &[(SignalId, SignalValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value this batch writes to `signal`, if any.
    pub fn value_of(&self, signal: &SignalId) -> Option<&SignalValue> {
        self.entries
            .iter()
            .find(|(s, _)| s == signal)
            .map(|(_, v)| v)
    }

    /// The first signal written more than once, in insertion order.
    pub fn first_duplicate(&self) -> Option<SignalId> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .map(|(signal, _)| *signal)
            .find(|signal| !seen.insert(*signal))
    }

    /// The first write whose value does not have the signal's type.
    pub fn first_type_mismatch(&self) -> Option<&(SignalId, SignalValue)> {
        self.entries
            .iter()
            .find(|(signal, value)| signal.value_type() != value.value_type())
    }
}
