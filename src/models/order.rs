use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Workshop lifecycle of a commissioned piece of furniture
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Completed and delivered orders no longer need workshop attention
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Read-only projection of an order joined with its customer's display name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub furniture_type: String,
    pub description: String,
    pub agreed_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: Option<NaiveDate>,
}

#[cfg(test)]
impl Order {
    /// Builds an order with a price given in cents and a `YYYY-MM-DD` creation day
    pub(crate) fn fixture(number: &str, cents: i64, status: OrderStatus, created_on: &str) -> Self {
        let created_at = NaiveDate::parse_from_str(created_on, "%Y-%m-%d")
            .expect("fixture date")
            .and_hms_opt(9, 0, 0)
            .expect("fixture time")
            .and_utc();

        Self {
            id: Uuid::new_v4(),
            order_number: number.to_string(),
            customer_id: Uuid::nil(),
            customer_name: "Ana Torres".to_string(),
            furniture_type: "Wardrobe".to_string(),
            description: "Oak wardrobe with two sliding doors".to_string(),
            agreed_price: Decimal::new(cents, 2),
            status,
            created_at,
            estimated_delivery: None,
        }
    }
}
