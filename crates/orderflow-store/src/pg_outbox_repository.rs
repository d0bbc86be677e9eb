//! `PostgreSQL` implementation of the `OutboxRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orderflow_core::error::DomainError;
use orderflow_core::outbox::{OutboxEvent, OutboxStatus};
use orderflow_core::repository::OutboxRepository;

/// PostgreSQL-backed outbox repository.
#[derive(Debug, Clone)]
pub struct PgOutboxRepository {
    pool: PgPool,
}

impl PgOutboxRepository {
    /// Creates a new `PgOutboxRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxEvent>, DomainError> {
        let rows: Vec<OutboxEventRow> = sqlx::query_as(
            r"
            SELECT id, aggregate_type, aggregate_id, event_type, payload,
                   status, retry_count, error_message, created_at, processed_at
            FROM outbox_events
            WHERE status = 'PENDING'
            ORDER BY created_at ASC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        rows.into_iter().map(OutboxEventRow::into_event).collect()
    }

    async fn mark_processed(&self, event_id: Uuid) -> Result<(), DomainError> {
        // The status guard makes this a no-op when another publisher
        // instance already processed the event.
        sqlx::query(
            r"
            UPDATE outbox_events
            SET status = 'PROCESSED', processed_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            ",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(infra)?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        event_id: Uuid,
        error: &str,
        max_retries: i32,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r"
            UPDATE outbox_events
            SET retry_count = retry_count + 1,
                error_message = $2,
                status = CASE WHEN retry_count + 1 >= $3 THEN 'FAILED' ELSE 'PENDING' END
            WHERE id = $1 AND status = 'PENDING'
            ",
        )
        .bind(event_id)
        .bind(error)
        .bind(max_retries)
        .execute(&self.pool)
        .await
        .map_err(infra)?;
        Ok(())
    }

    async fn list_failed(&self, limit: i64) -> Result<Vec<OutboxEvent>, DomainError> {
        let rows: Vec<OutboxEventRow> = sqlx::query_as(
            r"
            SELECT id, aggregate_type, aggregate_id, event_type, payload,
                   status, retry_count, error_message, created_at, processed_at
            FROM outbox_events
            WHERE status = 'FAILED'
            ORDER BY created_at ASC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        rows.into_iter().map(OutboxEventRow::into_event).collect()
    }
}

fn infra(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxEventRow {
    id: Uuid,
    aggregate_type: String,
    aggregate_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    status: String,
    retry_count: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl OutboxEventRow {
    fn into_event(self) -> Result<OutboxEvent, DomainError> {
        let status = OutboxStatus::parse(&self.status).ok_or_else(|| {
            DomainError::Infrastructure(format!("unknown outbox status in storage: {}", self.status))
        })?;
        Ok(OutboxEvent {
            event_id: self.id,
            aggregate_type: self.aggregate_type,
            aggregate_id: self.aggregate_id,
            event_type: self.event_type,
            payload: self.payload,
            status,
            retry_count: self.retry_count,
            error_message: self.error_message,
            created_at: self.created_at,
            processed_at: self.processed_at,
        })
    }
}
