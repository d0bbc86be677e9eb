//! Environment-driven configuration for the API server.

use std::time::Duration;

use orderflow_publisher::PublisherConfig;

use crate::error::AppError;

/// Configuration assembled from environment variables at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// PostgreSQL connection string (required).
    pub database_url: String,
    /// Kafka bootstrap servers.
    pub kafka_brokers: String,
    /// Maximum line items per order.
    pub max_order_items: usize,
    /// Outbox publisher tunables.
    pub publisher: PublisherConfig,
}

impl AppConfig {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `DATABASE_URL` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_owned()))?;
        let host = env_or("HOST", "0.0.0.0");
        let port = parse_env("PORT", 3000_u16)?;
        let kafka_brokers = env_or("KAFKA_BROKERS", "localhost:9092");
        let max_order_items = parse_env("ORDER_MAX_ITEMS", 100_usize)?;

        let defaults = PublisherConfig::default();
        let publisher = PublisherConfig {
            poll_interval: Duration::from_millis(parse_env(
                "OUTBOX_POLL_INTERVAL_MS",
                u64::try_from(defaults.poll_interval.as_millis()).unwrap_or(1000),
            )?),
            batch_size: parse_env("OUTBOX_BATCH_SIZE", defaults.batch_size)?,
            max_retries: parse_env("OUTBOX_MAX_RETRIES", defaults.max_retries)?,
            publish_timeout: Duration::from_millis(parse_env(
                "OUTBOX_PUBLISH_TIMEOUT_MS",
                u64::try_from(defaults.publish_timeout.as_millis()).unwrap_or(5000),
            )?),
        };

        Ok(Self {
            host,
            port,
            database_url,
            kafka_brokers,
            max_order_items,
            publisher,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| AppError::Config(format!("{name} is invalid: {err}"))),
        Err(_) => Ok(default),
    }
}
