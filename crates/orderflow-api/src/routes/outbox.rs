//! Operator routes for the outbox.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use orderflow_core::outbox::OutboxEvent;

use crate::error::ApiError;
use crate::state::AppState;

const FAILED_EVENTS_LIMIT: i64 = 100;

/// A FAILED outbox event, as shown to operators.
#[derive(Debug, Serialize)]
pub struct FailedEventResponse {
    /// Event identifier.
    pub id: Uuid,
    /// Aggregate type.
    pub aggregate_type: String,
    /// Aggregate identifier.
    pub aggregate_id: Uuid,
    /// Semantic event name.
    pub event_type: String,
    /// Event payload.
    pub payload: serde_json::Value,
    /// Number of failed publish attempts.
    pub retry_count: i32,
    /// Error from the last attempt.
    pub error_message: Option<String>,
    /// Timestamp of the committing transaction.
    pub created_at: DateTime<Utc>,
}

impl From<OutboxEvent> for FailedEventResponse {
    fn from(event: OutboxEvent) -> Self {
        Self {
            id: event.event_id,
            aggregate_type: event.aggregate_type,
            aggregate_id: event.aggregate_id,
            event_type: event.event_type,
            payload: event.payload,
            retry_count: event.retry_count,
            error_message: event.error_message,
            created_at: event.created_at,
        }
    }
}

/// GET /api/v1/outbox/failed
///
/// Events that exhausted their retries are never silently dropped; this is
/// the queryable dead-letter signal.
async fn list_failed(
    State(state): State<AppState>,
) -> Result<Json<Vec<FailedEventResponse>>, ApiError> {
    let events = state.outbox.list_failed(FAILED_EVENTS_LIMIT).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// Returns the router for the outbox operator surface.
pub fn router() -> Router<AppState> {
    Router::new().route("/failed", get(list_failed))
}
