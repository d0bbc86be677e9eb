//! Shared application state.

use std::sync::Arc;

use orderflow_core::repository::OutboxRepository;
use orderflow_orders::application::service::OrderService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The order lifecycle service.
    pub order_service: Arc<OrderService>,
    /// Outbox read surface for the operator endpoints.
    pub outbox: Arc<dyn OutboxRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(order_service: Arc<OrderService>, outbox: Arc<dyn OutboxRepository>) -> Self {
        Self {
            order_service,
            outbox,
        }
    }
}
