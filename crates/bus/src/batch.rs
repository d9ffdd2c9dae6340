//! Atomic batch submission.

use welcome_core::{Batch, SignalId};

use crate::client::{BusError, RejectedEntry, SignalBus};

/// A batch the bus did not accept.
///
/// `rejected` lists the entries the broker named; it is empty when the
/// failure was not attributable to individual writes (e.g. a lost
/// connection).
#[derive(Debug, Clone, thiserror::Error)]
#[error("Batch of {size} writes failed: {source}")]
pub struct BatchApplyError {
    pub size: usize,
    pub rejected: Vec<RejectedEntry>,
    pub source: BusError,
}

impl BatchApplyError {
    pub fn rejected_signals(&self) -> Vec<SignalId> {
        self.rejected.iter().map(|entry| entry.signal).collect()
    }
}

/// Submit `batch` through the bus's batched write.
///
/// No retries. An empty batch succeeds without touching the bus.
pub async fn apply_batch<B>(bus: &B, batch: &Batch) -> Result<(), BatchApplyError>
where
    B: SignalBus + ?Sized,
{
    if batch.is_empty() {
        return Ok(());
    }

    bus.set_many(batch.entries()).await.map_err(|source| {
        let rejected = match &source {
            BusError::Rejected { entries, .. } => entries.clone(),
            _ => Vec::new(),
        };
        BatchApplyError {
            size: batch.len(),
            rejected,
            source,
        }
    })?;

    tracing::debug!(writes = batch.len(), "Batch applied");
    Ok(())
}
