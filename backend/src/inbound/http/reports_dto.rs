//! Request and response payloads for the report endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    BoardColumn, Cluster, Error, GeoPoint, NewReport, ProfileView, Report, ReportRecord,
    ReportStatus,
};
use crate::domain::ports::SubmittedReport;
use crate::inbound::http::validation::{FieldName, parse_optional_department, parse_point};

/// Coordinates as sent by clients.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct PointPayload {
    pub lat: f64,
    pub lng: f64,
}

/// Body for `POST /api/v1/reports`.
///
/// Example JSON:
/// `{"title":"Broken streetlight","description":"Dark since Monday",
///   "category":"Electricity","location":{"lat":12.97,"lng":77.59}}`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewReportRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Department label, for example `Roads & Infrastructure`.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub location: Option<PointPayload>,
    #[serde(default)]
    pub address: Option<String>,
    /// Base64 data URL of a photo.
    #[serde(default)]
    pub image: Option<String>,
}

impl TryFrom<NewReportRequest> for NewReport {
    type Error = Error;

    fn try_from(value: NewReportRequest) -> Result<Self, Self::Error> {
        let category =
            parse_optional_department(value.category.as_deref(), FieldName::new("category"))?;
        let location = value
            .location
            .map(|point| parse_point(point.lat, point.lng, FieldName::new("location")))
            .transpose()?;
        Ok(Self {
            title: value.title,
            description: value.description,
            category,
            issue_type: value.issue_type,
            location,
            address: value.address,
            image: value.image,
        })
    }
}

/// Response for a filed report.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedReportResponse {
    #[schema(value_type = ReportRecord)]
    pub report: Report,
    pub profile: ProfileView,
}

impl From<SubmittedReport> for SubmittedReportResponse {
    fn from(value: SubmittedReport) -> Self {
        Self {
            report: value.report,
            profile: value.profile,
        }
    }
}

/// Body for `PUT /api/v1/reports/{id}/status`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatusUpdateRequest {
    /// One of `NEW`, `IN_PROGRESS`, `RESOLVED`, `VERIFIED`, `CLOSED`,
    /// `ESCALATED`.
    pub status: String,
}

/// Body for `PUT /api/v1/reports/{id}/worker`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerAssignmentRequest {
    pub worker_id: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportListQuery {
    /// Restrict to one status.
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClusterQuery {
    /// Join distance in degrees. Defaults to the server setting.
    pub threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkerQuery {
    /// Department label.
    pub department: Option<String>,
    /// Only workers free for dispatch.
    pub available: Option<bool>,
}

/// One map marker.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDto {
    pub center: GeoPoint,
    pub count: usize,
    #[schema(value_type = Vec<ReportRecord>)]
    pub reports: Vec<Report>,
}

impl From<Cluster> for ClusterDto {
    fn from(value: Cluster) -> Self {
        Self {
            center: value.center,
            count: value.reports.len(),
            reports: value.reports,
        }
    }
}

/// One command-centre board column.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumnDto {
    pub status: ReportStatus,
    pub count: usize,
    #[schema(value_type = Vec<ReportRecord>)]
    pub reports: Vec<Report>,
}

impl From<BoardColumn> for BoardColumnDto {
    fn from(value: BoardColumn) -> Self {
        Self {
            status: value.status,
            count: value.reports.len(),
            reports: value.reports,
        }
    }
}
