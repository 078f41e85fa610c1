//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path, query and body fields arrive as strings; these helpers turn them
//! into domain types and report failures with the offending field.

use serde_json::json;

use crate::domain::{Department, Error, GeoPoint, ReportId, ReportStatus, WorkerId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidIdentifier,
    UnknownStatus,
    UnknownDepartment,
    InvalidCoordinates,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidIdentifier => "invalid_identifier",
            ErrorCode::UnknownStatus => "unknown_status",
            ErrorCode::UnknownDepartment => "unknown_department",
            ErrorCode::InvalidCoordinates => "invalid_coordinates",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn parse_report_id(value: &str, field: FieldName) -> Result<ReportId, Error> {
    ReportId::new(value.trim()).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must not be empty"))
            .with_value(ErrorCode::InvalidIdentifier, value)
    })
}

pub(crate) fn parse_worker_id(value: &str, field: FieldName) -> Result<WorkerId, Error> {
    WorkerId::new(value.trim()).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must not be empty"))
            .with_value(ErrorCode::InvalidIdentifier, value)
    })
}

pub(crate) fn parse_status(value: &str, field: FieldName) -> Result<ReportStatus, Error> {
    value.parse::<ReportStatus>().map_err(|_| {
        let name = field.as_str();
        let known: Vec<&str> = ReportStatus::ALL.iter().map(|s| s.as_str()).collect();
        ValidationError::new(name, format!("{name} must be one of {}", known.join(", ")))
            .with_value(ErrorCode::UnknownStatus, value)
    })
}

pub(crate) fn parse_optional_status(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<ReportStatus>, Error> {
    value.map(|raw| parse_status(raw, field)).transpose()
}

pub(crate) fn parse_department(value: &str, field: FieldName) -> Result<Department, Error> {
    value.parse::<Department>().map_err(|_| {
        let name = field.as_str();
        let known: Vec<&str> = Department::ALL.iter().map(|d| d.label()).collect();
        ValidationError::new(name, format!("{name} must be one of {}", known.join(", ")))
            .with_value(ErrorCode::UnknownDepartment, value)
    })
}

pub(crate) fn parse_optional_department(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Department>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_department(raw, field))
        .transpose()
}

pub(crate) fn parse_point(lat: f64, lng: f64, field: FieldName) -> Result<GeoPoint, Error> {
    GeoPoint::new(lat, lng).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(
            name,
            format!("{name} must have latitude in [-90, 90] and longitude in [-180, 180]"),
        )
        .with_value(ErrorCode::InvalidCoordinates, format!("{lat},{lng}"))
    })
}

/// Both coordinates or neither.
pub(crate) fn parse_optional_point(
    lat: Option<f64>,
    lng: Option<f64>,
    field: FieldName,
) -> Result<Option<GeoPoint>, Error> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => parse_point(lat, lng, field).map(Some),
        (None, None) => Ok(None),
        _ => Err(missing_field_error(field)),
    }
}
