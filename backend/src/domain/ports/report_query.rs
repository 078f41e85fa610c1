//! Driving port for report read models.
//!
//! Every query answers from the locally synchronised view; none of them
//! reach the durable store.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    BoardColumn, Cluster, DailyVolume, Department, DepartmentPerformance, Error, Report, ReportId,
    ReportStatus, ReportSummary, UserId, Worker,
};

/// Command centre analytics bundle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub summary: ReportSummary,
    pub departments: Vec<DepartmentPerformance>,
    pub trend: Vec<DailyVolume>,
}

/// Worker listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerFilter {
    pub department: Option<Department>,
    pub available_only: bool,
}

/// Read-only report views served from the cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportQuery: Send + Sync {
    /// Every report, newest first, optionally restricted to one status.
    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, Error>;

    async fn get_report(&self, report_id: &ReportId) -> Result<Report, Error>;

    /// Reports filed by one citizen.
    async fn reports_filed_by(&self, reporter: &UserId) -> Result<Vec<Report>, Error>;

    /// Proximity clusters for the map view.
    async fn clusters(&self, threshold: Option<f64>) -> Result<Vec<Cluster>, Error>;

    /// Kanban columns for the command centre.
    async fn board(&self) -> Result<Vec<BoardColumn>, Error>;

    async fn analytics(&self) -> Result<AnalyticsOverview, Error>;

    async fn workers(&self, filter: WorkerFilter) -> Result<Vec<Worker>, Error>;
}
