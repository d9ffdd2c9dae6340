//! Signal change notifications and per-signal subscriptions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use welcome_core::{SignalId, SignalValue};

// ---------------------------------------------------------------------------
// SignalEvent
// ---------------------------------------------------------------------------

/// A value update observed on one signal.
///
/// `value` is `None` when the broker reported the signal without a
/// current value (e.g. the provider has not published yet).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvent {
    pub signal: SignalId,
    pub value: Option<SignalValue>,
    pub timestamp: DateTime<Utc>,
}

impl SignalEvent {
    /// An update carrying `value`, stamped now.
    pub fn new(signal: SignalId, value: impl Into<SignalValue>) -> Self {
        Self {
            signal,
            value: Some(value.into()),
            timestamp: Utc::now(),
        }
    }

    /// An update without a value, stamped now.
    pub fn without_value(signal: SignalId) -> Self {
        Self {
            signal,
            value: None,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Stream of [`SignalEvent`]s for a single signal.
///
/// Yields the retained value first (if the broker had one when the
/// subscription was made), then every later update in publish order.
#[derive(Debug)]
pub struct Subscription {
    signal: SignalId,
    retained: Option<SignalEvent>,
    receiver: broadcast::Receiver<SignalEvent>,
}

impl Subscription {
    /// Wrap the receiving end of `signal`'s broadcast channel.
    pub fn new(
        signal: SignalId,
        retained: Option<SignalEvent>,
        receiver: broadcast::Receiver<SignalEvent>,
    ) -> Self {
        Self {
            signal,
            retained,
            receiver,
        }
    }

    pub fn signal(&self) -> SignalId {
        self.signal
    }

    /// Wait for the next update.
    ///
    /// Returns `None` once the bus is gone. Cancel safe: dropping the
    /// future before it completes loses no event.
    pub async fn next(&mut self) -> Option<SignalEvent> {
        if let Some(event) = self.retained.take() {
            return Some(event);
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        signal = %self.signal,
                        skipped = n,
                        "Subscription lagged, some updates were dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(signal = %self.signal, "Signal bus closed, subscription ended");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use welcome_core::signals::DRIVER_DOOR_IS_OPEN;

    use super::*;

    #[tokio::test]
    async fn retained_event_is_yielded_first() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new(
            DRIVER_DOOR_IS_OPEN,
            Some(SignalEvent::new(DRIVER_DOOR_IS_OPEN, false)),
            rx,
        );

        tx.send(SignalEvent::new(DRIVER_DOOR_IS_OPEN, true))
            .expect("receiver alive");

        let first = sub.next().await.expect("retained event");
        let second = sub.next().await.expect("published event");
        assert_eq!(first.value, Some(SignalValue::Bool(false)));
        assert_eq!(second.value, Some(SignalValue::Bool(true)));
    }

    #[tokio::test]
    async fn event_without_value_is_delivered() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new(DRIVER_DOOR_IS_OPEN, None, rx);

        tx.send(SignalEvent::without_value(DRIVER_DOOR_IS_OPEN))
            .expect("receiver alive");

        let event = sub.next().await.expect("door event");
        assert_eq!(event.signal, DRIVER_DOOR_IS_OPEN);
        assert!(event.value.is_none());
    }

    #[tokio::test]
    async fn closed_channel_ends_subscription() {
        let (tx, rx) = broadcast::channel::<SignalEvent>(8);
        let mut sub = Subscription::new(DRIVER_DOOR_IS_OPEN, None, rx);
        drop(tx);

        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn lagged_subscription_resumes_with_newest_events() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = Subscription::new(DRIVER_DOOR_IS_OPEN, None, rx);

        for open in [true, false, true, false] {
            tx.send(SignalEvent::new(DRIVER_DOOR_IS_OPEN, open))
                .expect("receiver alive");
        }

        let event = sub.next().await.expect("event after lag");
        assert_eq!(event.value, Some(SignalValue::Bool(true)));
    }
}
