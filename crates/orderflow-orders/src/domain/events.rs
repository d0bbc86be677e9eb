//! Outbox event construction for the order lifecycle.

use orderflow_core::outbox::NewOutboxEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Order, OrderItem};
use super::status::OrderStatus;

/// Aggregate type recorded on every order event.
pub const ORDER_AGGREGATE_TYPE: &str = "ORDER";

/// Event type emitted on order creation.
pub const ORDER_CREATED_EVENT_TYPE: &str = "OrderCreated";

/// Returns the event type name for an order that just entered `status`.
#[must_use]
pub const fn event_type_for(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Created => ORDER_CREATED_EVENT_TYPE,
        OrderStatus::PaymentPending => "OrderPaymentPending",
        OrderStatus::PaymentConfirmed => "OrderPaymentConfirmed",
        OrderStatus::Processing => "OrderProcessing",
        OrderStatus::Completed => "OrderCompleted",
        OrderStatus::Cancelled => "OrderCancelled",
    }
}

/// Line item snapshot embedded in event payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
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
}

/// Self-contained snapshot of an order carried in every event payload.
///
/// Consumers interpret events from the payload alone; they never re-query
/// the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order identifier.
    pub order_id: Uuid,
    /// Human-readable business identifier.
    pub order_number: String,
    /// Owning user.
    pub user_id: String,
    /// Status after the mutation this event describes.
    pub status: OrderStatus,
    /// Order total.
    pub total_amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Line items.
    pub items: Vec<OrderItemSnapshot>,
    /// Cancellation reason, when the order is cancelled.
    pub cancellation_reason: Option<String>,
    /// Timestamp of the mutation; consumers may resequence on this.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

impl OrderSnapshot {
    /// Captures a snapshot of `order` as it stands right now.
    #[must_use]
    pub fn of(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id.clone(),
            status: order.status,
            total_amount: order.total_amount,
            currency: order.currency.clone(),
            items: order.items.iter().map(OrderItemSnapshot::of).collect(),
            cancellation_reason: order.cancellation_reason.clone(),
            occurred_at: order.updated_at,
        }
    }
}

impl OrderItemSnapshot {
    fn of(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }
}

/// Builds the outbox event describing the mutation that produced the
/// order's current state. The event type is derived from the status the
/// order just entered.
#[must_use]
pub fn order_event(order: &Order) -> NewOutboxEvent {
    let snapshot = OrderSnapshot::of(order);
    NewOutboxEvent {
        event_id: Uuid::new_v4(),
        aggregate_type: ORDER_AGGREGATE_TYPE.to_owned(),
        aggregate_id: order.id,
        event_type: event_type_for(order.status).to_owned(),
        // Serialization of derived Serialize types to Value is infallible.
        payload: serde_json::to_value(&snapshot)
            .expect("OrderSnapshot serialization is infallible"),
        created_at: order.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use orderflow_test_support::FixedClock;
    use rust_decimal_macros::dec;

    use crate::domain::order::NewOrderItem;

    #[test]
    fn test_event_type_tracks_destination_status() {
        assert_eq!(event_type_for(OrderStatus::Created), "OrderCreated");
        assert_eq!(event_type_for(OrderStatus::Completed), "OrderCompleted");
        assert_eq!(event_type_for(OrderStatus::Cancelled), "OrderCancelled");
    }

    #[test]
    fn test_order_event_carries_a_self_contained_snapshot() {
        // Arrange
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap());
        let order = Order::create(
            "user-1".to_owned(),
            "EUR".to_owned(),
            vec![NewOrderItem {
                product_id: Uuid::new_v4(),
                product_name: "Widget".to_owned(),
                quantity: 2,
                unit_price: dec!(10.00),
            }],
            Some("k1".to_owned()),
            100,
            &clock,
        )
        .unwrap();

        // Act
        let event = order_event(&order);

        // Assert
        assert_eq!(event.aggregate_type, ORDER_AGGREGATE_TYPE);
        assert_eq!(event.aggregate_id, order.id);
        assert_eq!(event.event_type, ORDER_CREATED_EVENT_TYPE);
        assert_eq!(event.created_at, order.created_at);

        let snapshot: OrderSnapshot = serde_json::from_value(event.payload).unwrap();
        assert_eq!(snapshot.order_id, order.id);
        assert_eq!(snapshot.order_number, order.order_number);
        assert_eq!(snapshot.status, OrderStatus::Created);
        assert_eq!(snapshot.total_amount, dec!(20.00));
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 2);
        assert_eq!(snapshot.occurred_at, order.updated_at);
    }

    #[test]
    fn test_cancellation_event_includes_the_reason() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap());
        let mut order = Order::create(
            "user-1".to_owned(),
            "EUR".to_owned(),
            vec![NewOrderItem {
                product_id: Uuid::new_v4(),
                product_name: "Widget".to_owned(),
                quantity: 1,
                unit_price: dec!(5.00),
            }],
            None,
            100,
            &clock,
        )
        .unwrap();
        order.cancel("payment declined".to_owned(), &clock).unwrap();

        let event = order_event(&order);

        assert_eq!(event.event_type, "OrderCancelled");
        let snapshot: OrderSnapshot = serde_json::from_value(event.payload).unwrap();
        assert_eq!(
            snapshot.cancellation_reason.as_deref(),
            Some("payment declined")
        );
    }
}
