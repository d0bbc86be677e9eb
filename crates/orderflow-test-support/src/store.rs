//! In-memory store — implements both repository traits behind one mutex so
//! the order+event pair-write is observably atomic, with the same uniqueness
//! and version semantics as the PostgreSQL implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use orderflow_core::error::DomainError;
use orderflow_core::outbox::{NewOutboxEvent, OutboxEvent, OutboxStatus};
use orderflow_core::repository::OutboxRepository;
use orderflow_orders::domain::order::Order;
use orderflow_orders::repository::OrderRepository;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    events: Vec<OutboxEvent>,
    miss_next_idempotency_lookup: bool,
}

/// In-memory order + outbox store for tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `find_by_idempotency_key` call miss, simulating the
    /// race window between the service's fast-path lookup and its insert.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn miss_next_idempotency_lookup(&self) {
        self.inner.lock().unwrap().miss_next_idempotency_lookup = true;
    }

    /// Bumps the stored version of an order, simulating a concurrent writer.
    ///
    /// # Panics
    ///
    /// Panics if the order does not exist or the internal mutex is poisoned.
    pub fn bump_version(&self, order_id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .orders
            .get_mut(&order_id)
            .expect("bump_version: order not found")
            .version += 1;
    }

    /// Returns a snapshot of all stored orders.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn orders_snapshot(&self) -> Vec<Order> {
        self.inner.lock().unwrap().orders.values().cloned().collect()
    }

    /// Returns a snapshot of all outbox events in creation order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn events_snapshot(&self) -> Vec<OutboxEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Inserts an outbox event directly, for seeding publisher tests.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_event(&self, event: OutboxEvent) {
        self.inner.lock().unwrap().events.push(event);
    }
}

fn stored_event(event: NewOutboxEvent) -> OutboxEvent {
    OutboxEvent {
        event_id: event.event_id,
        aggregate_type: event.aggregate_type,
        aggregate_id: event.aggregate_id,
        event_type: event.event_type,
        payload: event.payload,
        status: OutboxStatus::Pending,
        retry_count: 0,
        error_message: None,
        created_at: event.created_at,
        processed_at: None,
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.inner.lock().unwrap().orders.get(&order_id).cloned())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.miss_next_idempotency_lookup {
            inner.miss_next_idempotency_lookup = false;
            return Ok(None);
        }
        Ok(inner
            .orders
            .values()
            .find(|order| order.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn create(&self, order: &Order, event: NewOutboxEvent) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(key) = &order.idempotency_key {
            let taken = inner
                .orders
                .values()
                .any(|existing| existing.idempotency_key.as_ref() == Some(key));
            if taken {
                return Err(DomainError::DuplicateIdempotencyKey(key.clone()));
            }
        }
        inner.orders.insert(order.id, order.clone());
        inner.events.push(stored_event(event));
        Ok(())
    }

    async fn update(
        &self,
        order: &Order,
        expected_version: i64,
        event: NewOutboxEvent,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .orders
            .get(&order.id)
            .ok_or(DomainError::OrderNotFound(order.id))?;
        if stored.version != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                order_id: order.id,
                expected: expected_version,
            });
        }
        inner.orders.insert(order.id, order.clone());
        inner.events.push(stored_event(event));
        Ok(())
    }
}

#[async_trait]
impl OutboxRepository for InMemoryStore {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxEvent>, DomainError> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<OutboxEvent> = inner
            .events
            .iter()
            .filter(|event| event.status == OutboxStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|event| event.created_at);
        pending.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(pending)
    }

    async fn mark_processed(&self, event_id: Uuid) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(event) = inner
            .events
            .iter_mut()
            .find(|event| event.event_id == event_id)
        {
            // No-op unless still pending, matching the SQL guard.
            if event.status == OutboxStatus::Pending {
                event.status = OutboxStatus::Processed;
                event.processed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        event_id: Uuid,
        error: &str,
        max_retries: i32,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(event) = inner
            .events
            .iter_mut()
            .find(|event| event.event_id == event_id)
        {
            if event.status == OutboxStatus::Pending {
                event.retry_count += 1;
                event.error_message = Some(error.to_owned());
                if event.retry_count >= max_retries {
                    event.status = OutboxStatus::Failed;
                }
            }
        }
        Ok(())
    }

    async fn list_failed(&self, limit: i64) -> Result<Vec<OutboxEvent>, DomainError> {
        let inner = self.inner.lock().unwrap();
        let mut failed: Vec<OutboxEvent> = inner
            .events
            .iter()
            .filter(|event| event.status == OutboxStatus::Failed)
            .cloned()
            .collect();
        failed.sort_by_key(|event| event.created_at);
        failed.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(failed)
    }
}
