//! Domain layer for the order lifecycle context.

pub mod events;
pub mod order;
pub mod status;
