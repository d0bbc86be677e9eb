//! Broker seam between the outbox publisher and the message infrastructure.

use async_trait::async_trait;
use thiserror::Error;

use crate::outbox::OutboxEvent;

/// A failed publish attempt.
///
/// Deliberately separate from `DomainError`: publish failures are contained
/// inside the publisher loop and never reach order-service callers.
#[derive(Debug, Error)]
#[error("broker publish failed: {0}")]
pub struct BrokerError(pub String);

/// Destination for serialized outbox events.
#[async_trait]
pub trait EventBroker: Send + Sync {
    /// Publishes one event, keyed by its aggregate type and id.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` on any transient or permanent delivery failure;
    /// the caller decides whether to retry.
    async fn publish(&self, event: &OutboxEvent) -> Result<(), BrokerError>;
}
