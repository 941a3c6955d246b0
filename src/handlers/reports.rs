use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    app::AppState,
    error::Result,
    handlers::ApiResponse,
    models::InventorySummary,
    report::{
        normalize, normalize_with_format, DashboardSnapshot, ReportFormat, ReportQuery,
        ValidationError,
    },
    services::OrdersReport,
};

/// Filtered orders with their summary, as JSON or CSV
pub async fn orders_report(
    State(state): State<AppState>,
    query: std::result::Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response> {
    let (filter, format) = normalize_with_format(&report_query(query)?)?;

    match format {
        ReportFormat::Json => {
            let report: OrdersReport = state.reports.orders_report(&filter).await?;
            Ok(ApiResponse::ok(report).into_response())
        }
        ReportFormat::Csv => {
            let bytes = state.reports.orders_csv(&filter).await?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"orders_report.csv\"",
                    ),
                ],
                bytes,
            )
                .into_response())
        }
    }
}

/// Same filters as the JSON report, rendered as a printable PDF
pub async fn orders_pdf(
    State(state): State<AppState>,
    query: std::result::Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response> {
    let filter = normalize(&report_query(query)?)?;
    let document = state.reports.orders_document(&filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders_report.pdf\"",
            ),
        ],
        document.bytes,
    )
        .into_response())
}

/// A query string serde cannot read still answers with a validation envelope
fn report_query(
    query: std::result::Result<Query<ReportQuery>, QueryRejection>,
) -> std::result::Result<ReportQuery, ValidationError> {
    query.map(|Query(query)| query).map_err(|rejection| {
        ValidationError::rejected(&rejection.body_text(), ReportQuery::FIELDS, "query")
    })
}

pub async fn inventory_report(
    State(state): State<AppState>,
) -> Result<ApiResponse<InventorySummary>> {
    Ok(ApiResponse::ok(state.reports.inventory().await?))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<ApiResponse<DashboardSnapshot>> {
    Ok(ApiResponse::ok(state.reports.dashboard().await?))
}
