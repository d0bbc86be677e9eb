//! Orderflow Core — shared abstractions.
//!
//! This crate defines the error taxonomy, clock, outbox shapes, and the
//! repository/broker seams that all other crates depend on. It contains no
//! infrastructure code.

pub mod broker;
pub mod clock;
pub mod error;
pub mod outbox;
pub mod repository;
