//! Lifecycle engine: report creation, status transitions and dispatch.
//!
//! Every operation consumes the current value and returns the next one, so
//! callers decide when and how to persist. The status history invariant is
//! kept by [`Report`] itself.

use std::fmt;
use std::sync::Arc;

use mockable::Clock;

use super::ports::IdGenerator;
use super::{
    NewReport, Report, ReportId, ReportStatus, ReportValidationError, Roster, UserId, Worker,
    WorkerId, WorkerStatus,
};

/// Note attached to the first history entry of every report.
pub const GENESIS_NOTE: &str = "Report received by the command centre.";

/// Rejections raised by lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The store has not echoed the report yet, so it cannot be updated.
    NotPersisted { report_id: ReportId },
    /// The worker id is not on the roster.
    UnknownWorker { worker_id: WorkerId },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPersisted { report_id } => {
                write!(f, "report {report_id} has not been persisted yet")
            }
            Self::UnknownWorker { worker_id } => write!(f, "unknown worker {worker_id}"),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Outcome of [`LifecycleEngine::transition_status`].
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The report already had the requested status; nothing was recorded.
    Unchanged(Report),
    /// A history entry was appended.
    Changed {
        report: Report,
        /// Whether the reporter earns the verification reward. True only the
        /// first time a report reaches `VERIFIED`.
        award_verification: bool,
        /// Worker whose assignment ended with this transition.
        release: Option<WorkerId>,
    },
}

impl Transition {
    /// The report after the transition, changed or not.
    pub fn report(&self) -> &Report {
        match self {
            Self::Unchanged(report) | Self::Changed { report, .. } => report,
        }
    }

    /// Take the report out, dropping the bookkeeping.
    pub fn into_report(self) -> Report {
        match self {
            Self::Unchanged(report) | Self::Changed { report, .. } => report,
        }
    }
}

/// Outcome of [`LifecycleEngine::assign_worker`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// The report, now `IN_PROGRESS` with the worker attached.
    pub report: Report,
    /// The roster passed in, with the dispatch applied.
    pub roster: Roster,
    /// The dispatched worker as it now stands on the roster.
    pub worker: Worker,
    /// A different worker the report was taken away from.
    pub released: Option<WorkerId>,
}

/// Stateless rules for opening, moving and dispatching reports.
#[derive(Clone)]
pub struct LifecycleEngine {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl LifecycleEngine {
    /// Engine drawing report ids from `ids` and timestamps from `clock`.
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// Validate citizen input and open a report in `NEW`.
    pub fn create_report(
        &self,
        input: NewReport,
        reporter_id: UserId,
    ) -> Result<Report, ReportValidationError> {
        let fields = input.validate()?;
        let id = ReportId::from_uuid(&self.ids.next_uuid());
        Ok(Report::open(id, fields, reporter_id, self.clock.utc(), GENESIS_NOTE))
    }

    /// Move a persisted report to `status`.
    ///
    /// Requesting the current status is a no-op.
    pub fn transition_status(
        &self,
        mut report: Report,
        status: ReportStatus,
    ) -> Result<Transition, LifecycleError> {
        ensure_persisted(&report)?;
        if report.status() == status {
            return Ok(Transition::Unchanged(report));
        }

        let award_verification = status == ReportStatus::Verified && !report.was_ever_verified();
        let release = if status.releases_worker() {
            report.worker_id().cloned()
        } else {
            None
        };
        report.record_status(
            status,
            format!("Status set to {status} by municipal operations."),
            self.clock.utc(),
        );
        Ok(Transition::Changed {
            report,
            award_verification,
            release,
        })
    }

    /// Dispatch a worker, forcing the report to `IN_PROGRESS`.
    ///
    /// The worker becomes busy. A different worker previously on the report
    /// is released. The worker's department is not checked against the
    /// report's category.
    pub fn assign_worker(
        &self,
        mut report: Report,
        mut roster: Roster,
        worker_id: &WorkerId,
    ) -> Result<Dispatch, LifecycleError> {
        ensure_persisted(&report)?;
        let Some(found) = roster.find(worker_id) else {
            return Err(LifecycleError::UnknownWorker {
                worker_id: worker_id.clone(),
            });
        };
        let name = found.name.clone();

        let released = report
            .worker_id()
            .filter(|previous| *previous != worker_id)
            .cloned();
        if let Some(previous) = &released {
            roster.set_status(previous, WorkerStatus::Available);
        }
        roster.set_status(worker_id, WorkerStatus::Busy);
        report.set_worker(Some(worker_id.clone()));
        report.record_status(
            ReportStatus::InProgress,
            format!("Field deployment: {name} dispatched."),
            self.clock.utc(),
        );

        let worker = roster
            .find(worker_id)
            .cloned()
            .ok_or_else(|| LifecycleError::UnknownWorker {
                worker_id: worker_id.clone(),
            })?;
        Ok(Dispatch {
            report,
            roster,
            worker,
            released,
        })
    }

    /// Return a worker to the available pool.
    pub fn release_worker(&self, mut roster: Roster, worker_id: &WorkerId) -> Roster {
        roster.set_status(worker_id, WorkerStatus::Available);
        roster
    }
}

fn ensure_persisted(report: &Report) -> Result<(), LifecycleError> {
    if report.store_id().is_none() {
        return Err(LifecycleError::NotPersisted {
            report_id: report.id().clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
