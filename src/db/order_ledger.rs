//! Read-only access to the orders ledger.
//!
//! [`OrderLedger`] is the narrow interface the report pipeline depends on;
//! [`SqliteOrderLedger`] is the storage-backed implementation. Every read is
//! its own statement, so two calls may observe different instants (relaxed
//! consistency).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::{decode_date, decode_timestamp, encode_date, encode_timestamp, DbPool},
    models::{InventorySummary, Order, OrderStatus},
    report::{filter::FilterDescriptor, money},
};

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.customer_id, c.full_name AS customer_name,
           o.furniture_type, o.description, o.agreed_price_cents, o.status,
           o.created_at, o.estimated_delivery
    FROM orders o
    JOIN customers c ON o.customer_id = c.id
"#;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("malformed {column} in order {order}: {value:?}")]
    Decode {
        order: String,
        column: &'static str,
        value: String,
    },
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Orders matching `filter`, newest first (ties by id)
    async fn fetch_orders(&self, filter: &FilterDescriptor) -> Result<Vec<Order>, LedgerError>;

    /// Order count per status; statuses without orders may be absent
    async fn fetch_order_status_counts(&self) -> Result<HashMap<OrderStatus, u64>, LedgerError>;

    /// Materials with `current_stock <= min_stock_alert`
    async fn fetch_low_stock_count(&self) -> Result<u64, LedgerError>;

    async fn fetch_customer_count(&self) -> Result<u64, LedgerError>;

    /// The `limit` most recently created orders, newest first (ties by id)
    async fn fetch_recent_orders(&self, limit: u32) -> Result<Vec<Order>, LedgerError>;

    /// Non-terminal orders due between `today` and `today + window_days`
    /// inclusive, soonest first (ties by id), at most `limit`
    async fn fetch_upcoming_deliveries(
        &self,
        today: NaiveDate,
        window_days: u32,
        limit: u32,
    ) -> Result<Vec<Order>, LedgerError>;

    async fn fetch_inventory_summary(&self) -> Result<InventorySummary, LedgerError>;
}

/// Raw `orders JOIN customers` row as stored
#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_id: String,
    customer_name: String,
    furniture_type: String,
    description: String,
    agreed_price_cents: i64,
    status: OrderStatus,
    created_at: String,
    estimated_delivery: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = LedgerError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let malformed = |column: &'static str, value: &str| LedgerError::Decode {
            order: row.order_number.clone(),
            column,
            value: value.to_string(),
        };

        let id = Uuid::parse_str(&row.id).map_err(|_| malformed("id", &row.id))?;
        let customer_id = Uuid::parse_str(&row.customer_id)
            .map_err(|_| malformed("customer_id", &row.customer_id))?;
        let created_at = decode_timestamp(&row.created_at)
            .ok_or_else(|| malformed("created_at", &row.created_at))?;
        let estimated_delivery = match row.estimated_delivery.as_deref() {
            Some(value) => Some(
                decode_date(value).ok_or_else(|| malformed("estimated_delivery", value))?,
            ),
            None => None,
        };

        Ok(Order {
            id,
            order_number: row.order_number,
            customer_id,
            customer_name: row.customer_name,
            furniture_type: row.furniture_type,
            description: row.description,
            agreed_price: money::from_cents(row.agreed_price_cents),
            status: row.status,
            created_at,
            estimated_delivery,
        })
    }
}

fn decode_rows(rows: Vec<OrderRow>) -> Result<Vec<Order>, LedgerError> {
    rows.into_iter().map(Order::try_from).collect()
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Order ledger backed by the SQLite pool
#[derive(Clone)]
pub struct SqliteOrderLedger {
    pool: DbPool,
}

impl SqliteOrderLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLedger for SqliteOrderLedger {
    async fn fetch_orders(&self, filter: &FilterDescriptor) -> Result<Vec<Order>, LedgerError> {
        let mut query = QueryBuilder::<Sqlite>::new(ORDER_SELECT);
        let mut separator = " WHERE ";

        if let Some(from) = filter.created_from() {
            query.push(separator).push("o.created_at >= ").push_bind(encode_timestamp(&from));
            separator = " AND ";
        }
        if let Some(before) = filter.created_before() {
            query.push(separator).push("o.created_at < ").push_bind(encode_timestamp(&before));
            separator = " AND ";
        }
        if let Some(status) = filter.status() {
            query.push(separator).push("o.status = ").push_bind(status);
            separator = " AND ";
        }
        if let Some(customer_id) = filter.customer_id() {
            query.push(separator).push("o.customer_id = ").push_bind(customer_id.to_string());
        }

        query.push(" ORDER BY o.created_at DESC, o.id ASC");

        let rows = query
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "filtered order query failed"))?;

        decode_rows(rows)
    }

    async fn fetch_order_status_counts(&self) -> Result<HashMap<OrderStatus, u64>, LedgerError> {
        let rows: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| (status, to_count(count)))
            .collect())
    }

    async fn fetch_low_stock_count(&self) -> Result<u64, LedgerError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM materials WHERE current_stock_milli <= min_stock_alert_milli",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(count.0))
    }

    async fn fetch_customer_count(&self) -> Result<u64, LedgerError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(to_count(count.0))
    }

    async fn fetch_recent_orders(&self, limit: u32) -> Result<Vec<Order>, LedgerError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} ORDER BY o.created_at DESC, o.id ASC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        decode_rows(rows)
    }

    async fn fetch_upcoming_deliveries(
        &self,
        today: NaiveDate,
        window_days: u32,
        limit: u32,
    ) -> Result<Vec<Order>, LedgerError> {
        let window_end = today
            .checked_add_days(Days::new(u64::from(window_days)))
            .unwrap_or(NaiveDate::MAX);

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"{ORDER_SELECT}
            WHERE o.estimated_delivery IS NOT NULL
              AND o.estimated_delivery >= ?
              AND o.estimated_delivery <= ?
              AND o.status NOT IN ('completed', 'delivered')
            ORDER BY o.estimated_delivery ASC, o.id ASC
            LIMIT ?"#
        ))
        .bind(encode_date(&today))
        .bind(encode_date(&window_end))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        decode_rows(rows)
    }

    async fn fetch_inventory_summary(&self) -> Result<InventorySummary, LedgerError> {
        let (total_items, stock_value, low_stock_items): (i64, Option<i64>, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                SUM(current_stock_milli * COALESCE(unit_cost_cents, 0)),
                COUNT(CASE WHEN current_stock_milli <= min_stock_alert_milli THEN 1 END)
            FROM materials
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        // thousandths of a unit times cents
        let total_value = rust_decimal::Decimal::new(stock_value.unwrap_or(0), 5);

        Ok(InventorySummary {
            total_items: to_count(total_items),
            total_value: money::to_money(total_value),
            low_stock_items: to_count(low_stock_items),
        })
    }
}
