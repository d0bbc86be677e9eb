//! Outbox event shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of an outbox event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    /// Committed but not yet delivered to the broker.
    Pending,
    /// Delivered to the broker.
    Processed,
    /// Retries exhausted; requires operator intervention.
    Failed,
}

impl OutboxStatus {
    /// Returns the storage representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSED" => Some(Self::Processed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Stored representation of an outbox event.
#[derive(Debug, Clone)]
pub struct OutboxEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type of the entity this event describes (e.g. "ORDER").
    pub aggregate_type: String,
    /// Identifier of the entity this event describes.
    pub aggregate_id: Uuid,
    /// Semantic event name (e.g. "OrderCreated").
    pub event_type: String,
    /// Self-contained event body; consumers never re-query the source.
    pub payload: serde_json::Value,
    /// Publication status.
    pub status: OutboxStatus,
    /// Number of failed publish attempts so far.
    pub retry_count: i32,
    /// Error from the most recent failed attempt.
    pub error_message: Option<String>,
    /// Timestamp of the transaction that committed this event.
    pub created_at: DateTime<Utc>,
    /// Timestamp of successful publication.
    pub processed_at: Option<DateTime<Utc>>,
}

/// An outbox event about to be committed alongside its triggering mutation.
///
/// Status, retry count, and processing fields are owned by storage and the
/// publisher; a new event always starts out `PENDING` with zero retries.
#[derive(Debug, Clone)]
pub struct NewOutboxEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type of the entity this event describes (e.g. "ORDER").
    pub aggregate_type: String,
    /// Identifier of the entity this event describes.
    pub aggregate_id: Uuid,
    /// Semantic event name (e.g. "OrderCreated").
    pub event_type: String,
    /// Self-contained event body.
    pub payload: serde_json::Value,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_representation() {
        for status in [
            OutboxStatus::Pending,
            OutboxStatus::Processed,
            OutboxStatus::Failed,
        ] {
            assert_eq!(OutboxStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_string_is_rejected() {
        assert_eq!(OutboxStatus::parse("SHIPPED"), None);
    }
}
