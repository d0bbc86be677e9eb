//! Test brokers — mock `EventBroker` implementations for publisher tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use orderflow_core::broker::{BrokerError, EventBroker};
use orderflow_core::outbox::OutboxEvent;
use uuid::Uuid;

/// A broker that records every published event and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingBroker {
    published: Mutex<Vec<OutboxEvent>>,
}

impl RecordingBroker {
    /// Creates an empty recording broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published events, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published_snapshot(&self) -> Vec<OutboxEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Returns the ids of all published events, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published_ids(&self) -> Vec<Uuid> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.event_id)
            .collect()
    }
}

#[async_trait]
impl EventBroker for RecordingBroker {
    async fn publish(&self, event: &OutboxEvent) -> Result<(), BrokerError> {
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A broker that always fails. Useful for retry-exhaustion paths.
#[derive(Debug, Default)]
pub struct FailingBroker;

#[async_trait]
impl EventBroker for FailingBroker {
    async fn publish(&self, _event: &OutboxEvent) -> Result<(), BrokerError> {
        Err(BrokerError("broker unavailable".to_owned()))
    }
}

/// A broker that fails the first `fail_count` publish attempts, then records
/// and succeeds like [`RecordingBroker`].
#[derive(Debug)]
pub struct FlakyBroker {
    remaining_failures: AtomicU32,
    recorder: RecordingBroker,
}

impl FlakyBroker {
    /// Creates a broker whose first `fail_count` attempts fail.
    #[must_use]
    pub fn new(fail_count: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(fail_count),
            recorder: RecordingBroker::new(),
        }
    }

    /// Returns a snapshot of all successfully published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published_snapshot(&self) -> Vec<OutboxEvent> {
        self.recorder.published_snapshot()
    }
}

#[async_trait]
impl EventBroker for FlakyBroker {
    async fn publish(&self, event: &OutboxEvent) -> Result<(), BrokerError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(BrokerError("transient broker error".to_owned()));
        }
        self.recorder.publish(event).await
    }
}
