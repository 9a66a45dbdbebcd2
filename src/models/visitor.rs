//! Visitor record model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Visitor category chosen at the start of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisitorType {
    Regular,
    Service,
}

impl VisitorType {
    pub fn is_service_personnel(self) -> bool {
        matches!(self, VisitorType::Service)
    }
}

/// Persisted visitor record.
///
/// A record with `checked_out = false` is a visitor currently on site.
/// Checkout is a one-way transition: `checked_out` goes false -> true
/// exactly once and `check_out_time` is stamped at that moment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitorRecord {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    /// Name of the host being visited
    pub visiting: String,
    pub is_service_personnel: bool,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub checked_out: bool,
}

/// Commit payload produced by the wizard at terms acceptance.
/// One record is inserted per name; company, host and type are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOrder {
    pub names: Vec<String>,
    pub company: String,
    pub host_name: String,
    pub is_service_personnel: bool,
}

/// Direct check-in request (admin/manual path, bypasses the wizard)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckInRequest {
    /// Full visitor name
    #[validate(custom(function = "not_blank", message = "name must not be blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "company must not be blank"))]
    pub company: String,
    /// Name of the host being visited
    #[validate(custom(function = "not_blank", message = "visiting must not be blank"))]
    pub visiting: String,
    #[serde(default)]
    pub is_service_personnel: bool,
}

/// Rejects values that are empty once trimmed, so whitespace-only input
/// cannot end up persisted as an empty string.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// A previously seen visitor name with its visit count
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FrequentName {
    pub name: String,
    pub visit_count: i64,
}

/// Query parameters for the frequent-names autocomplete
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct FrequentNamesQuery {
    pub company: String,
    /// Name prefix, at least 2 characters
    pub prefix: String,
}

/// Query parameters for the history listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Maximum number of records to return (default 100)
    pub limit: Option<i64>,
}

/// Event published on the visitor feed when a record changes state
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisitorEvent {
    CheckedIn { record: VisitorRecord },
    CheckedOut { record: VisitorRecord },
}
