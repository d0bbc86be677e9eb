//! Order service — orchestrates idempotent creation and status transitions.

use std::sync::Arc;

use orderflow_core::clock::Clock;
use orderflow_core::error::DomainError;
use uuid::Uuid;

use crate::domain::events;
use crate::domain::order::{NewOrderItem, Order};
use crate::domain::status::OrderStatus;
use crate::repository::OrderRepository;

/// Tunables for the order service.
#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    /// Maximum number of line items accepted per order.
    pub max_items_per_order: usize,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            max_items_per_order: 100,
        }
    }
}

/// A creation request with pricing already resolved upstream.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// Owning user.
    pub user_id: String,
    /// ISO currency code.
    pub currency: String,
    /// Line items; must be non-empty.
    pub items: Vec<NewOrderItem>,
    /// Optional idempotency token; repeated submissions with the same token
    /// create exactly one order.
    pub idempotency_key: Option<String>,
}

/// Orchestrates order creation and status transitions.
///
/// Every successful mutation commits the order and exactly one outbox event
/// in a single atomic write; the broker is never called synchronously.
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    clock: Arc<dyn Clock>,
    config: OrderServiceConfig,
}

impl OrderService {
    /// Creates a new order service.
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        clock: Arc<dyn Clock>,
        config: OrderServiceConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    /// Creates an order exactly once per idempotency token.
    ///
    /// When the request carries a token already bound to an order, that
    /// order is returned unchanged and nothing is written. A concurrent
    /// duplicate submission that loses the storage uniqueness race is
    /// resolved the same way: re-read and return the winner.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for malformed items and
    /// `DomainError::Infrastructure` on storage failure.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, DomainError> {
        // Fast path; the uniqueness constraint below is the real guarantee.
        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = self.repository.find_by_idempotency_key(key).await? {
                tracing::debug!(
                    order_id = %existing.id,
                    idempotency_key = %key,
                    "duplicate submission, returning existing order"
                );
                return Ok(existing);
            }
        }

        let order = Order::create(
            request.user_id,
            request.currency,
            request.items,
            request.idempotency_key,
            self.config.max_items_per_order,
            self.clock.as_ref(),
        )?;
        let event = events::order_event(&order);

        match self.repository.create(&order, event).await {
            Ok(()) => {
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    total_amount = %order.total_amount,
                    "order created"
                );
                Ok(order)
            }
            Err(DomainError::DuplicateIdempotencyKey(key)) => {
                // Lost the race between the lookup and the insert; the
                // winner's order is the result of this call too.
                tracing::debug!(
                    idempotency_key = %key,
                    "lost idempotency race, returning winning order"
                );
                self.repository
                    .find_by_idempotency_key(&key)
                    .await?
                    .ok_or_else(|| {
                        DomainError::Infrastructure(format!(
                            "idempotency key {key} is taken but the owning order is not readable"
                        ))
                    })
            }
            Err(err) => Err(err),
        }
    }

    /// Moves an order to `new_status` and commits the matching outbox event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OrderNotFound` when the order does not exist,
    /// `DomainError::InvalidTransition` for an illegal edge (no write), and
    /// `DomainError::ConcurrencyConflict` when a concurrent writer won the
    /// version race — the caller should retry the read-modify-write.
    pub async fn transition_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self
            .repository
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let expected_version = order.version;
        order.transition(new_status, self.clock.as_ref())?;

        let event = events::order_event(&order);
        self.repository
            .update(&order, expected_version, event)
            .await?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            "order status changed"
        );
        Ok(order)
    }

    /// Cancels an order, recording `reason`.
    ///
    /// # Errors
    ///
    /// Same error surface as [`OrderService::transition_status`].
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: String,
    ) -> Result<Order, DomainError> {
        let mut order = self
            .repository
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let expected_version = order.version;
        order.cancel(reason, self.clock.as_ref())?;

        let event = events::order_event(&order);
        self.repository
            .update(&order, expected_version, event)
            .await?;

        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    /// Loads an order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OrderNotFound` when the order does not exist.
    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.repository
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }
}
