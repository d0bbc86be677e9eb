//! Application layer for the order lifecycle context.

pub mod service;
