//! Outbox repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::outbox::OutboxEvent;

/// Repository trait for the outbox side of the store.
///
/// Rows are inserted by the order repository inside the order transaction;
/// this trait covers only what the publisher and operator surfaces need.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Fetches up to `limit` PENDING events, oldest first by creation time.
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxEvent>, DomainError>;

    /// Marks an event as successfully published.
    ///
    /// Must be a no-op when the event is no longer PENDING, so that
    /// concurrent publisher instances cannot corrupt each other's updates.
    async fn mark_processed(&self, event_id: Uuid) -> Result<(), DomainError>;

    /// Records a failed publish attempt.
    ///
    /// Increments the retry count and stores `error`. Once the retry count
    /// reaches `max_retries` the event becomes FAILED (terminal); otherwise
    /// it stays PENDING and is retried on a later cycle.
    async fn mark_failed(
        &self,
        event_id: Uuid,
        error: &str,
        max_retries: i32,
    ) -> Result<(), DomainError>;

    /// Lists up to `limit` FAILED events, oldest first.
    ///
    /// FAILED events are the operator-visible dead-letter signal; they are
    /// never silently dropped.
    async fn list_failed(&self, limit: i64) -> Result<Vec<OutboxEvent>, DomainError>;
}
