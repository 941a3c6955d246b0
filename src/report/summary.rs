use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Order, OrderStatus};
use crate::report::money;

/// Totals and status histogram over a filtered order set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub total_orders: u64,
    pub total_value: Decimal,
    /// Only statuses that occur are keys. `None` when the histogram failed
    /// its consistency check and was withheld.
    pub by_status: Option<BTreeMap<OrderStatus, u64>>,
}

impl AggregateSummary {
    /// The histogram must account for every order. A mismatch is a defect:
    /// debug builds panic, release builds log it and drop the histogram.
    pub fn ensure_consistent(self) -> Self {
        debug_assert_eq!(
            self.histogram_count().unwrap_or(self.total_orders),
            self.total_orders,
            "status histogram does not add up to the order count"
        );
        self.withhold_inconsistent_histogram()
    }

    /// Drops a histogram that disagrees with `total_orders`, keeping the totals
    fn withhold_inconsistent_histogram(mut self) -> Self {
        if let Some(counted) = self.histogram_count() {
            if counted != self.total_orders {
                tracing::error!(
                    counted,
                    total_orders = self.total_orders,
                    "status histogram does not add up to the order count, omitting it"
                );
                self.by_status = None;
            }
        }
        self
    }

    fn histogram_count(&self) -> Option<u64> {
        self.by_status
            .as_ref()
            .map(|histogram| histogram.values().sum())
    }
}

/// Single pass over `orders`. Money is summed as exact decimals, so the
/// result does not depend on input order.
pub fn summarize<'a, I>(orders: I) -> AggregateSummary
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut total_orders = 0u64;
    let mut total_value = Decimal::ZERO;
    let mut by_status = BTreeMap::new();

    for order in orders {
        total_orders += 1;
        total_value += order.agreed_price;
        *by_status.entry(order.status).or_insert(0u64) += 1;
    }

    AggregateSummary {
        total_orders,
        total_value: money::to_money(total_value),
        by_status: Some(by_status),
    }
    .ensure_consistent()
}
