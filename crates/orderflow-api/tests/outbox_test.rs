//! Integration tests for the outbox operator endpoint.

mod common;

use axum::http::StatusCode;
use orderflow_core::repository::OutboxRepository;
use orderflow_store::PgOutboxRepository;
use sqlx::PgPool;
use uuid::Uuid;

fn create_body() -> serde_json::Value {
    serde_json::json!({
        "user_id": "user-1",
        "currency": "EUR",
        "items": [
            { "product_id": Uuid::new_v4(), "product_name": "Widget", "quantity": 1, "unit_price": "5.00" }
        ]
    })
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_failed_listing_is_empty_without_failures(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    common::post_json(app, "/api/v1/orders", &create_body()).await;

    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(app, "/api/v1/outbox/failed").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_exhausted_events_show_up_in_the_failed_listing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    common::post_json(app, "/api/v1/orders", &create_body()).await;

    let event_id: Uuid = sqlx::query_scalar("SELECT id FROM outbox_events LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();

    let outbox = PgOutboxRepository::new(pool.clone());
    for _ in 0..3 {
        outbox
            .mark_failed(event_id, "broker down", 3)
            .await
            .unwrap();
    }

    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(app, "/api/v1/outbox/failed").await;

    assert_eq!(status, StatusCode::OK);
    let failed = json.as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["id"], event_id.to_string());
    assert_eq!(failed[0]["event_type"], "OrderCreated");
    assert_eq!(failed[0]["retry_count"], 3);
    assert_eq!(failed[0]["error_message"], "broker down");
}
