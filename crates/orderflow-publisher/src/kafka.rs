//! Kafka implementation of the `EventBroker` trait.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use orderflow_core::broker::{BrokerError, EventBroker};
use orderflow_core::outbox::OutboxEvent;

/// Kafka-backed event broker.
///
/// Events are routed to a topic derived from their aggregate type
/// (`ORDER` → `order-events`) and keyed by aggregate id, so all events of
/// one order land in the same partition and keep their relative order.
pub struct KafkaEventBroker {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaEventBroker {
    /// Creates a broker client for the given bootstrap servers.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` when the producer cannot be constructed from
    /// the configuration.
    pub fn new(brokers: &str, timeout: Duration) -> Result<Self, BrokerError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", "all")
            .create()
            .map_err(|err| BrokerError(format!("kafka producer creation failed: {err}")))?;

        Ok(Self { producer, timeout })
    }

    fn topic_for(aggregate_type: &str) -> String {
        format!("{}-events", aggregate_type.to_lowercase())
    }
}

#[async_trait]
impl EventBroker for KafkaEventBroker {
    async fn publish(&self, event: &OutboxEvent) -> Result<(), BrokerError> {
        let topic = Self::topic_for(&event.aggregate_type);
        let key = event.aggregate_id.to_string();
        let payload = serde_json::to_vec(&event.payload)
            .map_err(|err| BrokerError(format!("payload serialization failed: {err}")))?;

        let record = FutureRecord::to(&topic).key(&key).payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(self.timeout))
            .await
        {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %topic,
                    partition,
                    offset,
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    "event delivered to broker"
                );
                Ok(())
            }
            Err((err, _owned_message)) => Err(BrokerError(format!(
                "delivery to {topic} failed: {err}"
            ))),
        }
    }
}
