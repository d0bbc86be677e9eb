//! Route modules.

pub mod health;
pub mod orders;
pub mod outbox;
