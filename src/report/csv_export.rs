use csv::Writer;

use crate::models::Order;
use crate::report::{money, RenderError};

const CSV_HEADER: &[&str] = &["Order #", "Customer", "Furniture type", "Date", "Status", "Amount"];

/// Serializes the report rows in the order given
pub fn write_csv(orders: &[Order]) -> Result<Vec<u8>, RenderError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for order in orders {
        let date = order.created_at.format("%Y-%m-%d").to_string();
        let amount = money::to_money(order.agreed_price).to_string();
        writer.write_record([
            order.order_number.as_str(),
            order.customer_name.as_str(),
            order.furniture_type.as_str(),
            date.as_str(),
            order.status.as_str(),
            amount.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::Io(e.into_error()))
}
