//! Order service tests.
//!
//! These live as an integration test rather than a `#[cfg(test)]` module in
//! `application/service.rs` because `orderflow-test-support` depends on this
//! crate: a unit-test build would compile a second copy of the crate whose
//! types don't unify with the ones `InMemoryStore` implements traits for.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use orderflow_core::error::DomainError;
use orderflow_core::outbox::OutboxStatus;
use orderflow_orders::application::service::{
    CreateOrderRequest, OrderService, OrderServiceConfig,
};
use orderflow_orders::domain::order::NewOrderItem;
use orderflow_orders::domain::status::OrderStatus;
use orderflow_test_support::{FixedClock, InMemoryStore};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn service_with_store() -> (OrderService, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap(),
    ));
    let service = OrderService::new(store.clone(), clock, OrderServiceConfig::default());
    (service, store)
}

fn request(key: Option<&str>) -> CreateOrderRequest {
    CreateOrderRequest {
        user_id: "user-1".to_owned(),
        currency: "EUR".to_owned(),
        items: vec![NewOrderItem {
            product_id: Uuid::new_v4(),
            product_name: "Widget".to_owned(),
            quantity: 2,
            unit_price: dec!(10.00),
        }],
        idempotency_key: key.map(str::to_owned),
    }
}

#[tokio::test]
async fn test_create_order_commits_order_and_creation_event_together() {
    let (service, store) = service_with_store();

    let order = service.create_order(request(Some("k1"))).await.unwrap();

    assert_eq!(order.total_amount, dec!(20.00));
    assert_eq!(order.status, OrderStatus::Created);

    let events = store.events_snapshot();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "OrderCreated");
    assert_eq!(events[0].aggregate_id, order.id);
    assert_eq!(events[0].status, OutboxStatus::Pending);
}

#[tokio::test]
async fn test_repeated_submission_with_same_token_returns_same_order() {
    let (service, store) = service_with_store();

    let first = service.create_order(request(Some("k1"))).await.unwrap();
    let second = service.create_order(request(Some("k1"))).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.orders_snapshot().len(), 1);
    assert_eq!(store.events_snapshot().len(), 1);
}

#[tokio::test]
async fn test_lost_idempotency_race_returns_the_winning_order() {
    // The fast-path lookup misses, the insert collides on the key, and
    // the caller still gets the winner instead of an error.
    let (service, store) = service_with_store();
    let winner = service.create_order(request(Some("k1"))).await.unwrap();

    store.miss_next_idempotency_lookup();
    let loser = service.create_order(request(Some("k1"))).await.unwrap();

    assert_eq!(winner.id, loser.id);
    assert_eq!(store.orders_snapshot().len(), 1);
    assert_eq!(store.events_snapshot().len(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_submissions_create_exactly_one_order() {
    let (service, store) = service_with_store();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.create_order(request(Some("k1"))).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.orders_snapshot().len(), 1);
    assert_eq!(store.events_snapshot().len(), 1);
}

#[tokio::test]
async fn test_create_order_without_token_always_creates() {
    let (service, store) = service_with_store();

    let first = service.create_order(request(None)).await.unwrap();
    let second = service.create_order(request(None)).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.orders_snapshot().len(), 2);
}

#[tokio::test]
async fn test_validation_failure_writes_nothing() {
    let (service, store) = service_with_store();
    let mut bad = request(None);
    bad.items.clear();

    let err = service.create_order(bad).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert!(store.orders_snapshot().is_empty());
    assert!(store.events_snapshot().is_empty());
}

#[tokio::test]
async fn test_transition_persists_order_and_event_atomically() {
    let (service, store) = service_with_store();
    let order = service.create_order(request(None)).await.unwrap();

    let updated = service
        .transition_status(order.id, OrderStatus::PaymentPending)
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::PaymentPending);
    assert_eq!(updated.version, 2);

    let events = store.events_snapshot();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].event_type, "OrderPaymentPending");
}

#[tokio::test]
async fn test_illegal_transition_writes_no_event() {
    let (service, store) = service_with_store();
    let order = service.create_order(request(None)).await.unwrap();

    let err = service
        .transition_status(order.id, OrderStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::InvalidTransition { .. }));
    assert_eq!(store.events_snapshot().len(), 1);
    let stored = service.get_order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Created);
}

#[tokio::test]
async fn test_transition_on_missing_order_is_not_found() {
    let (service, _store) = service_with_store();

    let err = service
        .transition_status(Uuid::new_v4(), OrderStatus::PaymentPending)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::OrderNotFound(_)));
}

#[tokio::test]
async fn test_cancel_order_records_reason_and_emits_event() {
    let (service, store) = service_with_store();
    let order = service.create_order(request(None)).await.unwrap();

    let cancelled = service
        .cancel_order(order.id, "payment declined".to_owned())
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("payment declined")
    );
    assert!(cancelled.cancelled_at.is_some());

    let events = store.events_snapshot();
    assert_eq!(events.last().unwrap().event_type, "OrderCancelled");
}

#[tokio::test]
async fn test_lost_version_race_surfaces_a_conflict() {
    let (service, store) = service_with_store();
    let order = service.create_order(request(None)).await.unwrap();

    // Another writer bumps the version between our read and our write.
    store.bump_version(order.id);

    let err = service
        .transition_status(order.id, OrderStatus::PaymentPending)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));
}

#[tokio::test]
async fn test_worked_example_scenario() {
    // create → duplicate create → illegal jump → PAYMENT_PENDING → CANCELLED
    let (service, store) = service_with_store();

    let order = service.create_order(request(Some("k1"))).await.unwrap();
    assert_eq!(order.total_amount, dec!(20.00));
    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(store.events_snapshot().len(), 1);

    let dup = service.create_order(request(Some("k1"))).await.unwrap();
    assert_eq!(dup.id, order.id);
    assert_eq!(store.events_snapshot().len(), 1);

    let err = service
        .transition_status(order.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));

    service
        .transition_status(order.id, OrderStatus::PaymentPending)
        .await
        .unwrap();
    let cancelled = service
        .transition_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(store.events_snapshot().len(), 3);
}
