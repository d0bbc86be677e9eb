//! `PostgreSQL` implementation of the `OrderRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use orderflow_core::error::DomainError;
use orderflow_core::outbox::NewOutboxEvent;
use orderflow_orders::domain::order::{Order, OrderItem};
use orderflow_orders::domain::status::OrderStatus;
use orderflow_orders::repository::OrderRepository;

/// Name of the unique constraint backing idempotent creation.
const IDEMPOTENCY_KEY_CONSTRAINT: &str = "orders_idempotency_key_key";

/// PostgreSQL-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new `PgOrderRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_order(&self, row: OrderRow) -> Result<Order, DomainError> {
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT id, order_id, product_id, product_name, quantity,
                   unit_price, total_price, created_at
            FROM order_items
            WHERE order_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        let items = item_rows.into_iter().map(OrderItem::from).collect();
        row.into_order(items)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, order_number, user_id, status, total_amount, currency,
                   idempotency_key, version, created_at, updated_at,
                   completed_at, cancelled_at, cancellation_reason
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;

        match row {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, order_number, user_id, status, total_amount, currency,
                   idempotency_key, version, created_at, updated_at,
                   completed_at, cancelled_at, cancellation_reason
            FROM orders
            WHERE idempotency_key = $1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;

        match row {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, order: &Order, event: NewOutboxEvent) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        sqlx::query(
            r"
            INSERT INTO orders
                (id, order_number, user_id, status, total_amount, currency,
                 idempotency_key, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(order.idempotency_key.as_deref())
        .bind(order.version)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| map_insert_error(err, order.idempotency_key.as_deref()))?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (id, order_id, product_id, product_name, quantity,
                     unit_price, total_price, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;
        }

        insert_outbox_event(&mut tx, &event).await?;

        tx.commit().await.map_err(infra)
    }

    async fn update(
        &self,
        order: &Order,
        expected_version: i64,
        event: NewOutboxEvent,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $1,
                updated_at = $2,
                completed_at = $3,
                cancelled_at = $4,
                cancellation_reason = $5,
                version = $6
            WHERE id = $7 AND version = $8
            ",
        )
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(order.cancellation_reason.as_deref())
        .bind(order.version)
        .bind(order.id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        if result.rows_affected() == 0 {
            // Either the order vanished or a concurrent writer won; the
            // transaction is dropped without committing anything.
            return Err(DomainError::ConcurrencyConflict {
                order_id: order.id,
                expected: expected_version,
            });
        }

        insert_outbox_event(&mut tx, &event).await?;

        tx.commit().await.map_err(infra)
    }
}

/// Inserts an outbox event inside the caller's transaction, so the event is
/// committed together with the order mutation that produced it.
async fn insert_outbox_event(
    tx: &mut Transaction<'_, Postgres>,
    event: &NewOutboxEvent,
) -> Result<(), DomainError> {
    sqlx::query(
        r"
        INSERT INTO outbox_events
            (id, aggregate_type, aggregate_id, event_type, payload,
             status, retry_count, created_at)
        VALUES ($1, $2, $3, $4, $5, 'PENDING', 0, $6)
        ",
    )
    .bind(event.event_id)
    .bind(&event.aggregate_type)
    .bind(event.aggregate_id)
    .bind(&event.event_type)
    .bind(&event.payload)
    .bind(event.created_at)
    .execute(&mut **tx)
    .await
    .map_err(infra)?;
    Ok(())
}

fn infra(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

fn map_insert_error(err: sqlx::Error, idempotency_key: Option<&str>) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(IDEMPOTENCY_KEY_CONSTRAINT) {
            return DomainError::DuplicateIdempotencyKey(
                idempotency_key.unwrap_or_default().to_owned(),
            );
        }
    }
    infra(err)
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: String,
    status: String,
    total_amount: Decimal,
    currency: String,
    idempotency_key: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, DomainError> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            DomainError::Infrastructure(format!("unknown order status in storage: {}", self.status))
        })?;
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            status,
            total_amount: self.total_amount,
            currency: self.currency,
            idempotency_key: self.idempotency_key,
            items,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            cancellation_reason: self.cancellation_reason,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            created_at: row.created_at,
        }
    }
}
