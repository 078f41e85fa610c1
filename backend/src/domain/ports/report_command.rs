//! Driving port for report mutations.
//!
//! Inbound adapters call this port to file reports and to move them through
//! the municipal workflow. Implementations own persistence and the side
//! effects on the reporter's profile.

use async_trait::async_trait;

use crate::domain::{Error, NewReport, ProfileView, Report, ReportId, ReportStatus, UserId, WorkerId};

/// Outcome of filing a report: the stored report and the reporter's
/// profile after the dispatch reward.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedReport {
    pub report: Report,
    pub profile: ProfileView,
}

/// Report lifecycle commands exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportCommand: Send + Sync {
    /// Validate, store and reward a new report.
    async fn submit_report(
        &self,
        reporter: &UserId,
        input: NewReport,
    ) -> Result<SubmittedReport, Error>;

    /// Move a report to `status`. Repeating the current status is a no-op.
    async fn update_status(&self, report_id: &ReportId, status: ReportStatus)
    -> Result<Report, Error>;

    /// Dispatch a field worker to a report.
    async fn assign_worker(&self, report_id: &ReportId, worker_id: &WorkerId)
    -> Result<Report, Error>;
}
