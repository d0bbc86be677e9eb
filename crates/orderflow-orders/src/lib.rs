//! Orderflow — order lifecycle bounded context.
//!
//! The domain layer holds the order aggregate, the status state machine, and
//! outbox event construction. The application layer orchestrates creation and
//! transitions against the order repository.

pub mod application;
pub mod domain;
pub mod repository;
