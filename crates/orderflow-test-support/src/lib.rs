//! Shared test mocks and utilities for the Orderflow service.

mod broker;
mod clock;
mod store;

pub use broker::{FailingBroker, FlakyBroker, RecordingBroker};
pub use clock::FixedClock;
pub use store::InMemoryStore;
