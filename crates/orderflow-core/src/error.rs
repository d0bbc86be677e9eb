//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A malformed creation request, rejected before any write.
    #[error("validation error: {0}")]
    Validation(String),

    /// An order-status edge not permitted by the state machine.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(Uuid),

    /// Optimistic concurrency conflict on an order write.
    #[error("concurrency conflict on order {order_id}: expected version {expected}")]
    ConcurrencyConflict {
        /// The order that had the conflict.
        order_id: Uuid,
        /// The version the writer expected to find.
        expected: i64,
    },

    /// Another order already holds this idempotency key.
    #[error("idempotency key already used: {0}")]
    DuplicateIdempotencyKey(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
