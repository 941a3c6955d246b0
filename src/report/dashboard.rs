//! Dashboard snapshot.
//!
//! Five independent ledger reads run concurrently and are joined before the
//! snapshot is built. Any failed read fails the whole dashboard.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::db::{LedgerError, OrderLedger};
use crate::models::{Order, OrderStatus};

pub const RECENT_ORDERS_LIMIT: u32 = 5;
pub const UPCOMING_DELIVERIES_LIMIT: u32 = 5;
pub const UPCOMING_WINDOW_DAYS: u32 = 7;

/// Order count for every status, zero when the ledger has none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub delivered: u64,
}

impl StatusCounts {
    pub fn from_histogram(histogram: &HashMap<OrderStatus, u64>) -> Self {
        let count = |status| histogram.get(&status).copied().unwrap_or(0);
        Self {
            pending: count(OrderStatus::Pending),
            in_progress: count(OrderStatus::InProgress),
            completed: count(OrderStatus::Completed),
            delivered: count(OrderStatus::Delivered),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub orders: StatusCounts,
    pub low_stock: u64,
    pub total_customers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
    pub upcoming_deliveries: Vec<Order>,
}

/// Builds the snapshot as of `today`.
///
/// The reads are separate statements, so the sections may observe slightly
/// different instants. That is accepted; a partially failed snapshot is not.
pub async fn compose_dashboard(
    ledger: &dyn OrderLedger,
    today: NaiveDate,
) -> Result<DashboardSnapshot, LedgerError> {
    let (histogram, low_stock, total_customers, mut recent_orders, mut upcoming_deliveries) =
        tokio::try_join!(
            ledger.fetch_order_status_counts(),
            ledger.fetch_low_stock_count(),
            ledger.fetch_customer_count(),
            ledger.fetch_recent_orders(RECENT_ORDERS_LIMIT),
            ledger.fetch_upcoming_deliveries(
                today,
                UPCOMING_WINDOW_DAYS,
                UPCOMING_DELIVERIES_LIMIT
            ),
        )?;

    recent_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    recent_orders.truncate(RECENT_ORDERS_LIMIT as usize);

    let window_end = today
        .checked_add_days(Days::new(u64::from(UPCOMING_WINDOW_DAYS)))
        .unwrap_or(NaiveDate::MAX);
    upcoming_deliveries.retain(|order| {
        !order.status.is_terminal()
            && order
                .estimated_delivery
                .is_some_and(|due| due >= today && due <= window_end)
    });
    upcoming_deliveries.sort_by(|a, b| {
        a.estimated_delivery
            .cmp(&b.estimated_delivery)
            .then(a.id.cmp(&b.id))
    });
    upcoming_deliveries.truncate(UPCOMING_DELIVERIES_LIMIT as usize);

    tracing::debug!(
        recent = recent_orders.len(),
        upcoming = upcoming_deliveries.len(),
        "composed dashboard"
    );

    Ok(DashboardSnapshot {
        stats: DashboardStats {
            orders: StatusCounts::from_histogram(&histogram),
            low_stock,
            total_customers,
        },
        recent_orders,
        upcoming_deliveries,
    })
}
