//! Report pipeline: filter normalization, aggregation, the dashboard
//! snapshot and the CSV / PDF exports.

pub mod csv_export;
pub mod dashboard;
pub mod document;
pub mod filter;
pub mod money;
pub mod summary;

use thiserror::Error;

pub use dashboard::{compose_dashboard, DashboardSnapshot};
pub use filter::{
    normalize, normalize_with_format, FilterDescriptor, ReportFormat, ReportQuery,
    ValidationError,
};
pub use summary::{summarize, AggregateSummary};

/// Export assembly failed; no partial output is ever returned
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document would exceed {limit} pages")]
    PageLimitExceeded { limit: usize },

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("render task failed: {0}")]
    Task(String),
}
