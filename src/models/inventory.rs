use rust_decimal::Decimal;
use serde::Serialize;

/// Stock valuation across all materials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total_items: u64,
    /// Σ current_stock × unit_cost, materials without a cost count as zero
    pub total_value: Decimal,
    /// Materials at or below their alert threshold
    pub low_stock_items: u64,
}
