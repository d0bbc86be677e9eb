//! The order aggregate.

use chrono::{DateTime, Utc};
use orderflow_core::clock::Clock;
use orderflow_core::error::DomainError;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::status::OrderStatus;

/// A line item as submitted by the caller, with pricing already resolved.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    /// The product identifier.
    pub product_id: Uuid,
    /// Display name of the product at order time.
    pub product_name: String,
    /// Ordered quantity; must be positive.
    pub quantity: i32,
    /// Unit price resolved upstream.
    pub unit_price: Decimal,
}

/// A persisted order line item.
#[derive(Debug, Clone)]
pub struct OrderItem {
    /// Line item identifier.
    pub id: Uuid,
    /// Owning order.
    pub order_id: Uuid,
    /// The product identifier.
    pub product_id: Uuid,
    /// Display name of the product at order time.
    pub product_name: String,
    /// Ordered quantity.
    pub quantity: i32,
    /// Unit price at order time.
    pub unit_price: Decimal,
    /// quantity × unit price.
    pub total_price: Decimal,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
}

/// The order aggregate root.
#[derive(Debug, Clone)]
pub struct Order {
    /// Order identifier, immutable after creation.
    pub id: Uuid,
    /// Human-readable unique business identifier.
    pub order_number: String,
    /// Owning user.
    pub user_id: String,
    /// Current lifecycle status; changes only through [`Order::transition`].
    pub status: OrderStatus,
    /// Sum of all item total prices, fixed at creation.
    pub total_amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Caller-supplied token making creation idempotent; unique when present.
    pub idempotency_key: Option<String>,
    /// Line items, in submission order.
    pub items: Vec<OrderItem>,
    /// Optimistic concurrency version, bumped on every mutation.
    pub version: i64,
    /// Timestamp of creation, immutable.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent mutation.
    pub updated_at: DateTime<Utc>,
    /// Set once, on transition to COMPLETED.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set once, on transition to CANCELLED.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Set only on cancellation; possibly empty.
    pub cancellation_reason: Option<String>,
}

impl Order {
    /// Creates a new order in status CREATED from validated input.
    ///
    /// Validates the line items (non-empty, positive quantities, at most
    /// `max_items`) and computes each line total and the order total from
    /// fixed-point decimals.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the items are malformed.
    pub fn create(
        user_id: String,
        currency: String,
        items: Vec<NewOrderItem>,
        idempotency_key: Option<String>,
        max_items: usize,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::Validation(
                "order must contain at least one item".to_owned(),
            ));
        }
        if items.len() > max_items {
            return Err(DomainError::Validation(format!(
                "order contains {} items, maximum is {max_items}",
                items.len()
            )));
        }
        if let Some(item) = items.iter().find(|item| item.quantity <= 0) {
            return Err(DomainError::Validation(format!(
                "quantity for product {} must be positive, got {}",
                item.product_id, item.quantity
            )));
        }

        let now = clock.now();
        let order_id = Uuid::new_v4();

        let items: Vec<OrderItem> = items
            .into_iter()
            .map(|item| {
                let total_price = Decimal::from(item.quantity) * item.unit_price;
                OrderItem {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price,
                    created_at: now,
                }
            })
            .collect();

        let total_amount: Decimal = items.iter().map(|item| item.total_price).sum();

        Ok(Self {
            id: order_id,
            order_number: order_number(now, order_id),
            user_id,
            status: OrderStatus::Created,
            total_amount,
            currency,
            idempotency_key,
            items,
            version: 1,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        })
    }

    /// Moves the order to `to` if the state machine permits the edge.
    ///
    /// This is the only path by which `status` changes. Entering a terminal
    /// state stamps `completed_at` / `cancelled_at`; a direct transition to
    /// CANCELLED records an empty cancellation reason.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` for any edge not in the
    /// transition table; the order is left unmodified.
    pub fn transition(&mut self, to: OrderStatus, clock: &dyn Clock) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.status.as_str().to_owned(),
                to: to.as_str().to_owned(),
            });
        }

        let now = clock.now();
        self.status = to;
        self.updated_at = now;
        self.version += 1;
        match to {
            OrderStatus::Completed => self.completed_at = Some(now),
            OrderStatus::Cancelled => {
                self.cancelled_at = Some(now);
                if self.cancellation_reason.is_none() {
                    self.cancellation_reason = Some(String::new());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Cancels the order, recording `reason`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` when the order is already in
    /// a terminal state.
    pub fn cancel(&mut self, reason: String, clock: &dyn Clock) -> Result<(), DomainError> {
        self.transition(OrderStatus::Cancelled, clock)?;
        self.cancellation_reason = Some(reason);
        Ok(())
    }
}

/// Derives the human-readable order number from the creation date and a
/// fragment of the order id, e.g. `ORD-20260830-A1B2C3D4`.
fn order_number(created_at: DateTime<Utc>, order_id: Uuid) -> String {
    let (fragment, _) = order_id.as_u64_pair();
    format!(
        "ORD-{}-{:08X}",
        created_at.format("%Y%m%d"),
        (fragment >> 32) as u32
    )
}
