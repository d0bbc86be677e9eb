//! Orderflow HTTP API — routing, state, and error mapping.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
