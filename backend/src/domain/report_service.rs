//! Report domain service.
//!
//! Implements [`ReportCommand`] and [`ReportQuery`] over the durable store,
//! the synchronised [`ReportCache`], the dispatch roster and the reporter's
//! stored profile. Engines decide; this service sequences the writes.
//!
//! Lifecycle commands run one at a time. Each reads the cached report,
//! writes the change to the store and folds the acknowledged result back
//! into the cache before the next command starts, so a command never
//! decides on history the store has already moved past.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use super::analytics::{board, department_performance, summary, volume_trend};
use super::clustering::{DEFAULT_CLUSTER_THRESHOLD, cluster};
use super::ports::{
    AnalyticsOverview, IdGenerator, ProfileStore, ReportCommand, ReportGateway, ReportQuery,
    SubmittedReport, WorkerFilter,
};
use super::profile_book::ProfileBook;
use super::service_errors::{
    gamification_rejected, lifecycle_rejected, report_invalid, store_failed,
};
use super::{
    BoardColumn, Cluster, DISPATCH_REWARD, Error, ErrorCode, GamificationEngine, LifecycleEngine,
    NewReport, NotificationEvent, ProfileView, Report, ReportCache, ReportId, ReportStatus,
    Roster, Transition, UserId, VERIFICATION_REWARD, Worker, WorkerId, WorkerStatus,
};

/// Days covered by the analytics volume trend.
pub const TREND_DAYS: u64 = 7;

/// Report commands and queries over a store, the cache and the roster.
pub struct ReportService<G: ?Sized, S: ?Sized> {
    gateway: Arc<G>,
    commands: AsyncMutex<()>,
    cache: Arc<ReportCache>,
    profiles: Arc<ProfileBook<S>>,
    roster: Mutex<Roster>,
    lifecycle: LifecycleEngine,
    gamification: GamificationEngine,
    clock: Arc<dyn Clock>,
    cluster_threshold: f64,
}

impl<G, S> ReportService<G, S>
where
    G: ReportGateway + ?Sized,
    S: ProfileStore + ?Sized,
{
    /// Create a service dispatching from the standard roster.
    pub fn new(
        gateway: Arc<G>,
        cache: Arc<ReportCache>,
        profiles: Arc<ProfileBook<S>>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            commands: AsyncMutex::new(()),
            cache,
            profiles,
            roster: Mutex::new(Roster::standard()),
            lifecycle: LifecycleEngine::new(Arc::clone(&ids), Arc::clone(&clock)),
            gamification: GamificationEngine::new(ids, Arc::clone(&clock)),
            clock,
            cluster_threshold: DEFAULT_CLUSTER_THRESHOLD,
        }
    }

    /// Dispatch from `roster` instead of the standard one.
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = Mutex::new(roster);
        self
    }

    /// Threshold used when a cluster request does not name one.
    pub fn with_cluster_threshold(mut self, threshold: f64) -> Self {
        self.cluster_threshold = threshold;
        self
    }

    fn roster(&self) -> Result<MutexGuard<'_, Roster>, Error> {
        self.roster
            .lock()
            .map_err(|_| Error::internal("dispatch roster lock poisoned"))
    }

    fn cached(&self, report_id: &ReportId) -> Result<Report, Error> {
        self.cache
            .find(report_id)
            .ok_or_else(|| Error::not_found(format!("report {report_id} not found")))
    }

    /// Persist the lifecycle fields of `report`, then show it in the cache.
    async fn write_back(&self, report: &Report) -> Result<(), Error> {
        let store_id = report.store_id().ok_or_else(|| {
            Error::conflict(format!("report {} has not been persisted yet", report.id()))
        })?;
        self.gateway
            .update(store_id, &report.lifecycle_patch())
            .await
            .map_err(store_failed)?;
        self.cache.upsert(report.clone());
        Ok(())
    }

    /// Apply availability changes for the named workers only.
    fn mark_workers(&self, changes: &[(&WorkerId, WorkerStatus)]) -> Result<(), Error> {
        let mut roster = self.roster()?;
        for (worker_id, status) in changes {
            roster.set_status(worker_id, *status);
        }
        Ok(())
    }

    /// Reports filed by `reporter`, with `current` standing in for its
    /// cached copy.
    fn filed_with(&self, reporter: &UserId, current: &Report) -> Vec<Report> {
        let mut filed = self.cache.filed_by(reporter);
        filed.retain(|report| report.id() != current.id());
        filed.push(current.clone());
        filed
    }

    /// Tell the reporter about `event`, crediting the verification reward
    /// when `award` is set.
    ///
    /// A reporter without a stored profile here is skipped.
    async fn update_reporter(
        &self,
        report: &Report,
        event: NotificationEvent,
        award: bool,
    ) -> Result<(), Error> {
        let reporter = report.reporter_id();
        let filed = self.filed_with(reporter, report);
        let gamification = &self.gamification;
        let outcome = self
            .profiles
            .modify(reporter, |state, notifier| {
                let mut user = state.user.clone();
                if award {
                    user = gamification
                        .credit_points(
                            user,
                            VERIFICATION_REWARD,
                            format!("Report verified: {}", report.title()),
                        )
                        .map_err(gamification_rejected)?;
                }
                let evaluation = gamification.evaluate_badges(user, &filed);
                state.user = evaluation.user;
                notifier.notify(state, event);
                for badge in evaluation.unlocked {
                    notifier.notify(state, NotificationEvent::badge_unlocked(badge));
                }
                Ok(())
            })
            .await;
        match outcome {
            Err(err) if err.code() == ErrorCode::Unauthorized => {
                warn!(
                    report_id = %report.id(),
                    reporter_id = %reporter,
                    "reporter has no stored profile; skipping profile update"
                );
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait]
impl<G, S> ReportCommand for ReportService<G, S>
where
    G: ReportGateway + ?Sized,
    S: ProfileStore + ?Sized,
{
    async fn submit_report(
        &self,
        reporter: &UserId,
        input: NewReport,
    ) -> Result<SubmittedReport, Error> {
        let report = self
            .lifecycle
            .create_report(input, reporter.clone())
            .map_err(report_invalid)?;
        self.profiles.read(reporter).await?;

        let store_id = self.gateway.create(&report).await.map_err(store_failed)?;
        let report = report.with_store_id(store_id);
        self.cache.upsert(report.clone());
        info!(
            report_id = %report.id(),
            store_id = ?report.store_id().map(|id| id.as_str()),
            category = report.category().label(),
            "report filed"
        );

        let filed = self.filed_with(reporter, &report);
        let gamification = &self.gamification;
        let submitted = &report;
        let profile = self
            .profiles
            .modify(reporter, |state, notifier| {
                let user = gamification
                    .credit_points(state.user.clone(), DISPATCH_REWARD, "Report dispatch reward")
                    .map_err(gamification_rejected)?;
                let evaluation = gamification.evaluate_badges(user, &filed);
                state.user = evaluation.user;
                notifier.notify(state, NotificationEvent::report_submitted(submitted));
                for badge in evaluation.unlocked {
                    notifier.notify(state, NotificationEvent::badge_unlocked(badge));
                }
                Ok(ProfileView::from(&*state))
            })
            .await?;

        Ok(SubmittedReport { report, profile })
    }

    async fn update_status(
        &self,
        report_id: &ReportId,
        status: ReportStatus,
    ) -> Result<Report, Error> {
        let _turn = self.commands.lock().await;
        let current = self.cached(report_id)?;
        let transition = self
            .lifecycle
            .transition_status(current, status)
            .map_err(lifecycle_rejected)?;
        let (report, award_verification, release) = match transition {
            Transition::Unchanged(report) => {
                info!(%report_id, %status, "status unchanged");
                return Ok(report);
            }
            Transition::Changed {
                report,
                award_verification,
                release,
            } => (report, award_verification, release),
        };

        self.write_back(&report).await?;
        info!(%report_id, %status, award_verification, "report status updated");

        if let Some(worker_id) = release {
            self.mark_workers(&[(&worker_id, WorkerStatus::Available)])?;
            info!(%report_id, %worker_id, "worker released");
        }

        self.update_reporter(
            &report,
            NotificationEvent::status_changed(&report, status),
            award_verification,
        )
        .await?;
        Ok(report)
    }

    async fn assign_worker(
        &self,
        report_id: &ReportId,
        worker_id: &WorkerId,
    ) -> Result<Report, Error> {
        let _turn = self.commands.lock().await;
        let current = self.cached(report_id)?;
        let roster = self.roster()?.clone();
        let dispatch = self
            .lifecycle
            .assign_worker(current, roster, worker_id)
            .map_err(lifecycle_rejected)?;

        self.write_back(&dispatch.report).await?;
        let mut changes = vec![(worker_id, WorkerStatus::Busy)];
        if let Some(previous) = &dispatch.released {
            changes.push((previous, WorkerStatus::Available));
        }
        self.mark_workers(&changes)?;
        info!(%report_id, %worker_id, "worker dispatched");

        self.update_reporter(
            &dispatch.report,
            NotificationEvent::worker_dispatched(&dispatch.report, &dispatch.worker),
            false,
        )
        .await?;
        Ok(dispatch.report)
    }
}

#[async_trait]
impl<G, S> ReportQuery for ReportService<G, S>
where
    G: ReportGateway + ?Sized,
    S: ProfileStore + ?Sized,
{
    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>, Error> {
        Ok(self.cache.with_status(status))
    }

    async fn get_report(&self, report_id: &ReportId) -> Result<Report, Error> {
        self.cached(report_id)
    }

    async fn reports_filed_by(&self, reporter: &UserId) -> Result<Vec<Report>, Error> {
        Ok(self.cache.filed_by(reporter))
    }

    async fn clusters(&self, threshold: Option<f64>) -> Result<Vec<Cluster>, Error> {
        let threshold = threshold.unwrap_or(self.cluster_threshold);
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(Error::invalid_request("cluster threshold must be positive")
                .with_details(serde_json::json!({ "field": "threshold" })));
        }
        Ok(cluster(&self.cache.snapshot(), threshold))
    }

    async fn board(&self) -> Result<Vec<BoardColumn>, Error> {
        Ok(board(&self.cache.snapshot()))
    }

    async fn analytics(&self) -> Result<AnalyticsOverview, Error> {
        let reports = self.cache.snapshot();
        Ok(AnalyticsOverview {
            summary: summary(&reports),
            departments: department_performance(&reports),
            trend: volume_trend(&reports, self.clock.utc(), TREND_DAYS),
        })
    }

    async fn workers(&self, filter: WorkerFilter) -> Result<Vec<Worker>, Error> {
        let roster = self.roster()?;
        let workers = if filter.available_only {
            roster.available_in(filter.department).cloned().collect()
        } else {
            roster
                .all()
                .iter()
                .filter(|worker| filter.department.is_none_or(|wanted| worker.department == wanted))
                .cloned()
                .collect()
        };
        Ok(workers)
    }
}

#[cfg(test)]
#[path = "report_service_tests.rs"]
mod tests;
