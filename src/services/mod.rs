pub mod auth_service;
pub mod report_service;

pub use auth_service::{AuthError, AuthService};
pub use report_service::{OrdersReport, ReportService};
