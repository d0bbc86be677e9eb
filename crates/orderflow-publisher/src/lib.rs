//! Orderflow outbox publisher.
//!
//! A periodic worker drains PENDING outbox events to the broker with bounded
//! retry; the Kafka client lives behind the `EventBroker` seam so tests run
//! against in-memory brokers.

pub mod kafka;
pub mod publisher;

pub use kafka::KafkaEventBroker;
pub use publisher::{BatchOutcome, OutboxPublisher, PublisherConfig, PublisherHandle};
