//! Orderflow API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use orderflow_api::config::AppConfig;
use orderflow_api::routes;
use orderflow_api::state::AppState;
use orderflow_core::broker::EventBroker;
use orderflow_core::clock::SystemClock;
use orderflow_core::repository::OutboxRepository;
use orderflow_orders::application::service::{OrderService, OrderServiceConfig};
use orderflow_orders::repository::OrderRepository;
use orderflow_publisher::{KafkaEventBroker, OutboxPublisher};
use orderflow_store::{PgOrderRepository, PgOutboxRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Orderflow API server");

    let config = AppConfig::from_env()?;

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let clock = Arc::new(SystemClock);
    let order_repository: Arc<dyn OrderRepository> =
        Arc::new(PgOrderRepository::new(pool.clone()));
    let outbox_repository: Arc<dyn OutboxRepository> =
        Arc::new(PgOutboxRepository::new(pool.clone()));

    let order_service = Arc::new(OrderService::new(
        order_repository,
        clock,
        OrderServiceConfig {
            max_items_per_order: config.max_order_items,
        },
    ));

    // Start the outbox publisher next to the HTTP server. The two share
    // nothing but the database, so a crash of either loses no events.
    let broker: Arc<dyn EventBroker> = Arc::new(KafkaEventBroker::new(
        &config.kafka_brokers,
        config.publisher.publish_timeout,
    )?);
    let publisher = OutboxPublisher::new(
        outbox_repository.clone(),
        broker,
        config.publisher.clone(),
    );
    let publisher_handle = publisher.start();

    // Build application state and router.
    let app_state = AppState::new(order_service, outbox_repository);

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/orders", routes::orders::router())
        .nest("/api/v1/outbox", routes::outbox::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the publisher after the server; unpublished events stay PENDING
    // and are drained on the next start.
    publisher_handle.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install shutdown signal handler");
    }
}
