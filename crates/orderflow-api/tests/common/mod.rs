//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use orderflow_api::routes;
use orderflow_api::state::AppState;
use orderflow_core::clock::Clock;
use orderflow_core::repository::OutboxRepository;
use orderflow_orders::application::service::{OrderService, OrderServiceConfig};
use orderflow_orders::repository::OrderRepository;
use orderflow_store::{PgOrderRepository, PgOutboxRepository};
use orderflow_test_support::FixedClock;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 8, 30, 12, 0, 0).unwrap(),
    ))
}

/// Build the full app router with real PostgreSQL repositories and a
/// deterministic clock. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let order_repository: Arc<dyn OrderRepository> =
        Arc::new(PgOrderRepository::new(pool.clone()));
    let outbox_repository: Arc<dyn OutboxRepository> = Arc::new(PgOutboxRepository::new(pool));

    let order_service = Arc::new(OrderService::new(
        order_repository,
        fixed_clock(),
        OrderServiceConfig::default(),
    ));
    let app_state = AppState::new(order_service, outbox_repository);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/orders", routes::orders::router())
        .nest("/api/v1/outbox", routes::outbox::router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
