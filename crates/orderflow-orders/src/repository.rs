//! Order repository abstraction.
//!
//! The atomic order+event pair-write is the linchpin of the design: `create`
//! and `update` commit the order mutation and its outbox event in one unit,
//! so no mutation of interest can exist without its event.

use async_trait::async_trait;
use orderflow_core::error::DomainError;
use orderflow_core::outbox::NewOutboxEvent;
use uuid::Uuid;

use crate::domain::order::Order;

/// Repository trait for orders and their line items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order with its items.
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, DomainError>;

    /// Loads the order holding an idempotency key, if any.
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError>;

    /// Inserts a new order, its items, and its creation event atomically.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateIdempotencyKey` when another order
    /// already holds the key — the storage-level uniqueness constraint, not
    /// an application-level check, resolves concurrent duplicate
    /// submissions.
    async fn create(&self, order: &Order, event: NewOutboxEvent) -> Result<(), DomainError>;

    /// Persists a mutated order plus its outbox event atomically, guarded by
    /// an optimistic version check.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` when the stored version no
    /// longer equals `expected_version`; nothing is written in that case.
    async fn update(
        &self,
        order: &Order,
        expected_version: i64,
        event: NewOutboxEvent,
    ) -> Result<(), DomainError>;
}
