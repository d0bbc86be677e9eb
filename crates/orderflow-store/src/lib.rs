//! PostgreSQL-backed repositories for Orderflow.
//!
//! The order repository owns the atomic order+outbox pair-write: one
//! transaction inserts the order rows and the outbox event, so no committed
//! mutation can exist without its event.

pub mod pg_order_repository;
pub mod pg_outbox_repository;

pub use pg_order_repository::PgOrderRepository;
pub use pg_outbox_repository::PgOutboxRepository;
