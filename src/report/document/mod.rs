//! Printable orders report.
//!
//! Rendering is split in two phases: [`layout`] places every row on fixed
//! pages and accumulates the total, [`pdf`] serializes the finished pages.
//! Nothing is emitted until layout has fully succeeded.

pub mod layout;
pub mod pdf;
pub mod text;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::Order;
use crate::report::{filter::FilterDescriptor, RenderError};

use layout::{Composer, HeaderText, PageGeometry};

pub const REPORT_TITLE: &str = "Orders Report";

#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub company_name: String,
    pub geometry: PageGeometry,
}

impl DocumentSettings {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            geometry: PageGeometry::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub total: Decimal,
}

/// Lays out and serializes `orders` in the order given.
///
/// `generated_at` is printed in the title block; the same inputs always give
/// the same bytes.
pub fn render(
    orders: &[Order],
    filters: &FilterDescriptor,
    settings: &DocumentSettings,
    generated_at: DateTime<Utc>,
) -> Result<RenderedDocument, RenderError> {
    let header = HeaderText {
        company_name: settings.company_name.clone(),
        generated: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        filters: describe_filters(filters),
    };

    let layout = Composer::new(orders, header, settings.geometry).run()?;
    let bytes = pdf::serialize(&layout, &settings.geometry, REPORT_TITLE);

    tracing::debug!(
        rows = orders.len(),
        pages = layout.pages.len(),
        bytes = bytes.len(),
        "rendered orders document"
    );

    Ok(RenderedDocument {
        bytes,
        page_count: layout.pages.len(),
        total: layout.total,
    })
}

/// `From: 2024-01-01 | Status: pending`, or `None` when nothing is set
fn describe_filters(filters: &FilterDescriptor) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(start) = filters.start_date() {
        parts.push(format!("From: {start}"));
    }
    if let Some(end) = filters.end_date() {
        parts.push(format!("To: {end}"));
    }
    if let Some(status) = filters.status() {
        parts.push(format!("Status: {status}"));
    }
    if let Some(customer) = filters.customer_id() {
        parts.push(format!("Customer: {customer}"));
    }

    (!parts.is_empty()).then(|| parts.join(" | "))
}
