//! Routes for the order lifecycle context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orderflow_orders::application::service::CreateOrderRequest;
use orderflow_orders::domain::order::{NewOrderItem, Order};
use orderflow_orders::domain::status::OrderStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for order creation.
#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    /// Owning user.
    pub user_id: String,
    /// ISO currency code.
    pub currency: String,
    /// Optional idempotency token.
    pub idempotency_key: Option<String>,
    /// Line items with pricing resolved upstream.
    pub items: Vec<CreateOrderItemBody>,
}

/// One line item in a creation request.
#[derive(Debug, Deserialize)]
pub struct CreateOrderItemBody {
    /// The product identifier.
    pub product_id: Uuid,
    /// Display name of the product.
    pub product_name: String,
    /// Ordered quantity.
    pub quantity: i32,
    /// Unit price.
    pub unit_price: Decimal,
}

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    /// Destination status.
    pub status: OrderStatus,
}

/// Request body for cancellation.
#[derive(Debug, Deserialize)]
pub struct CancelBody {
    /// Reason recorded on the order; may be empty.
    #[serde(default)]
    pub reason: String,
}

/// Serialized order returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order identifier.
    pub id: Uuid,
    /// Human-readable business identifier.
    pub order_number: String,
    /// Owning user.
    pub user_id: String,
    /// Current status.
    pub status: OrderStatus,
    /// Order total.
    pub total_amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Idempotency token, when one was supplied.
    pub idempotency_key: Option<String>,
    /// Line items.
    pub items: Vec<OrderItemResponse>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent mutation.
    pub updated_at: DateTime<Utc>,
    /// Set on completion.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set on cancellation.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Set on cancellation; possibly empty.
    pub cancellation_reason: Option<String>,
}

/// One serialized line item.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    /// The product identifier.
    pub product_id: Uuid,
    /// Display name of the product.
    pub product_name: String,
    /// Ordered quantity.
    pub quantity: i32,
    /// Unit price.
    pub unit_price: Decimal,
    /// quantity × unit price.
    pub total_price: Decimal,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            currency: order.currency,
            idempotency_key: order.idempotency_key,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
            version: order.version,
            created_at: order.created_at,
            updated_at: order.updated_at,
            completed_at: order.completed_at,
            cancelled_at: order.cancelled_at,
            cancellation_reason: order.cancellation_reason,
        }
    }
}

/// POST /api/v1/orders
async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let request = CreateOrderRequest {
        user_id: body.user_id,
        currency: body.currency,
        idempotency_key: body.idempotency_key,
        items: body
            .items
            .into_iter()
            .map(|item| NewOrderItem {
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    };

    let order = state.order_service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/v1/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// POST /api/v1/orders/{id}/status
async fn transition_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .order_service
        .transition_status(order_id, body.status)
        .await?;
    Ok(Json(order.into()))
}

/// POST /api/v1/orders/{id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<CancelBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .order_service
        .cancel_order(order_id, body.reason)
        .await?;
    Ok(Json(order.into()))
}

/// Returns the router for the orders context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/status", post(transition_status))
        .route("/{id}/cancel", post(cancel_order))
}
