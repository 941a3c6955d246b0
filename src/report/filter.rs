//! Report filter model.
//!
//! Turns the raw `start_date` / `end_date` / `status` / `customer_id` query
//! parameters into a [`FilterDescriptor`]. Every malformed field is reported,
//! nothing is silently corrected, and an empty descriptor matches every order.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::OrderStatus;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw report query parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub format: Option<String>,
}

impl ReportQuery {
    pub const FIELDS: &'static [&'static str] =
        &["start_date", "end_date", "status", "customer_id", "format"];
}

/// Output format of the tabular orders report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

/// Canonical, validated set of order constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDescriptor {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    status: Option<OrderStatus>,
    customer_id: Option<Uuid>,
}

impl FilterDescriptor {
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        self.customer_id
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Inclusive lower bound on `created_at`: midnight UTC of `start_date`
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(start_of_day)
    }

    /// Exclusive upper bound on `created_at`: midnight UTC after `end_date`
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .map(start_of_day)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// One offending query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid report filter: {}", field_list(.details))]
pub struct ValidationError {
    pub details: Vec<FieldError>,
}

impl ValidationError {
    pub fn has_field(&self, field: &str) -> bool {
        self.details.iter().any(|detail| detail.field == field)
    }

    /// Input the extractor could not deserialize at all, such as a repeated
    /// query parameter. Attributed to the first known field the message
    /// names in backticks, else to `fallback`.
    pub fn rejected(message: &str, fields: &[&'static str], fallback: &'static str) -> Self {
        let field = message
            .split('`')
            .skip(1)
            .step_by(2)
            .find_map(|quoted| fields.iter().copied().find(|field| *field == quoted))
            .unwrap_or(fallback);

        Self {
            details: vec![FieldError::new(field, message)],
        }
    }
}

fn field_list(details: &[FieldError]) -> String {
    details
        .iter()
        .map(|detail| detail.field)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates the filter parameters, ignoring `format`
pub fn normalize(raw: &ReportQuery) -> Result<FilterDescriptor, ValidationError> {
    let mut errors = Vec::new();
    let filter = collect_filter(raw, &mut errors);
    finish(filter, errors)
}

/// Validates the filter parameters together with the requested output format
pub fn normalize_with_format(
    raw: &ReportQuery,
) -> Result<(FilterDescriptor, ReportFormat), ValidationError> {
    let mut errors = Vec::new();
    let filter = collect_filter(raw, &mut errors);

    let format = match present(raw.format.as_deref()) {
        None | Some("json") => ReportFormat::Json,
        Some("csv") => ReportFormat::Csv,
        Some(_) => {
            errors.push(FieldError::new("format", "must be one of json, csv"));
            ReportFormat::Json
        }
    };

    finish(filter, errors).map(|filter| (filter, format))
}

fn finish(
    filter: FilterDescriptor,
    errors: Vec<FieldError>,
) -> Result<FilterDescriptor, ValidationError> {
    if errors.is_empty() {
        Ok(filter)
    } else {
        Err(ValidationError { details: errors })
    }
}

fn collect_filter(raw: &ReportQuery, errors: &mut Vec<FieldError>) -> FilterDescriptor {
    let start_date = parse_date("start_date", raw.start_date.as_deref(), errors);
    let end_date = parse_date("end_date", raw.end_date.as_deref(), errors);

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            errors.push(FieldError::new(
                "end_date",
                "must be on or after start_date",
            ));
        }
    }

    let status = present(raw.status.as_deref()).and_then(|value| {
        value
            .parse::<OrderStatus>()
            .map_err(|_| {
                errors.push(FieldError::new(
                    "status",
                    "must be one of pending, in_progress, completed, delivered",
                ))
            })
            .ok()
    });

    let customer_id = present(raw.customer_id.as_deref()).and_then(|value| {
        Uuid::parse_str(value)
            .map_err(|_| errors.push(FieldError::new("customer_id", "must be a valid UUID")))
            .ok()
    });

    FilterDescriptor {
        start_date,
        end_date,
        status,
        customer_id,
    }
}

fn parse_date(
    field: &'static str,
    value: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    let value = present(value)?;
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| errors.push(FieldError::new(field, "must be a date in YYYY-MM-DD format")))
        .ok()
}

/// Absent and blank parameters both mean "no constraint"
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
