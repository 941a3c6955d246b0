use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::{
    db::OrderLedger,
    error::{AppError, Result},
    models::{InventorySummary, Order},
    report::{
        compose_dashboard, csv_export,
        document::{self, DocumentSettings, RenderedDocument},
        summarize, AggregateSummary, DashboardSnapshot, FilterDescriptor, RenderError,
    },
};

/// Filtered rows together with their summary
#[derive(Debug, Serialize)]
pub struct OrdersReport {
    pub orders: Vec<Order>,
    pub summary: AggregateSummary,
}

/// Runs the report pipeline against an order ledger
#[derive(Clone)]
pub struct ReportService {
    ledger: Arc<dyn OrderLedger>,
    document: Arc<DocumentSettings>,
}

impl ReportService {
    pub fn new(ledger: Arc<dyn OrderLedger>, document: DocumentSettings) -> Self {
        Self {
            ledger,
            document: Arc::new(document),
        }
    }

    pub async fn orders_report(&self, filter: &FilterDescriptor) -> Result<OrdersReport> {
        let orders = self.ledger.fetch_orders(filter).await?;
        let summary = summarize(&orders);

        tracing::info!(
            rows = orders.len(),
            filtered = !filter.is_empty(),
            "built orders report"
        );

        Ok(OrdersReport { orders, summary })
    }

    pub async fn orders_csv(&self, filter: &FilterDescriptor) -> Result<Vec<u8>> {
        let orders = self.ledger.fetch_orders(filter).await?;
        let bytes = csv_export::write_csv(&orders)?;

        tracing::info!(rows = orders.len(), filtered = !filter.is_empty(), "exported orders csv");
        Ok(bytes)
    }

    /// Layout is CPU bound, so it runs on the blocking pool
    pub async fn orders_document(&self, filter: &FilterDescriptor) -> Result<RenderedDocument> {
        let orders = self.ledger.fetch_orders(filter).await?;
        let settings = Arc::clone(&self.document);
        let filter = filter.clone();
        let generated_at = Utc::now();

        let rendered = tokio::task::spawn_blocking(move || {
            document::render(&orders, &filter, &settings, generated_at)
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

        tracing::info!(
            pages = rendered.page_count,
            bytes = rendered.bytes.len(),
            "rendered orders document"
        );
        Ok(rendered)
    }

    pub async fn inventory(&self) -> Result<InventorySummary> {
        Ok(self.ledger.fetch_inventory_summary().await?)
    }

    pub async fn dashboard(&self) -> Result<DashboardSnapshot> {
        let today = Utc::now().date_naive();
        compose_dashboard(self.ledger.as_ref(), today)
            .await
            .map_err(AppError::from)
    }
}
