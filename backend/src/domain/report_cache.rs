//! Local view of the report collection, fed by store snapshots.
//!
//! [`ReportSync`] replaces the whole view on every store snapshot. Between
//! snapshots the report service folds its own acknowledged writes in with
//! [`ReportCache::upsert`], so follow-up commands never work on a copy the
//! store has already moved past. Readers borrow the latest value or
//! subscribe to changes.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{info, warn};

use super::ports::{ReportGateway, ReportGatewayError};
use super::{Report, ReportId, ReportStatus, UserId};

/// Shared, immutable snapshot of every report, newest first.
pub type Snapshot = Arc<Vec<Report>>;

/// Latest view of the report collection, shared by every reader.
pub struct ReportCache {
    tx: watch::Sender<Snapshot>,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCache {
    /// Empty cache; readers see no reports until the first snapshot.
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(Arc::new(Vec::new())),
        }
    }

    /// Replace the view wholesale.
    pub fn apply(&self, reports: Vec<Report>) {
        self.tx.send_replace(Arc::new(reports));
    }

    /// Swap in `report` for the record with the same id, or insert it in
    /// `createdAt` order when it is new, and publish the result.
    pub fn upsert(&self, report: Report) {
        self.tx.send_modify(|snapshot| {
            let mut reports = Vec::clone(snapshot);
            match reports.iter_mut().find(|cached| cached.id() == report.id()) {
                Some(slot) => *slot = report,
                None => {
                    let at = reports
                        .iter()
                        .position(|cached| cached.created_at() <= report.created_at())
                        .unwrap_or(reports.len());
                    reports.insert(at, report);
                }
            }
            *snapshot = Arc::new(reports);
        });
    }

    /// Current snapshot without waiting for the next change.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver that observes every subsequent snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn find(&self, id: &ReportId) -> Option<Report> {
        self.tx.borrow().iter().find(|report| report.id() == id).cloned()
    }

    /// Reports filed by `reporter`, newest first.
    pub fn filed_by(&self, reporter: &UserId) -> Vec<Report> {
        self.tx
            .borrow()
            .iter()
            .filter(|report| report.reporter_id() == reporter)
            .cloned()
            .collect()
    }

    /// Reports in `status`, or all of them when `status` is `None`.
    pub fn with_status(&self, status: Option<ReportStatus>) -> Vec<Report> {
        self.tx
            .borrow()
            .iter()
            .filter(|report| status.is_none_or(|wanted| report.status() == wanted))
            .cloned()
            .collect()
    }
}

/// Why a sync run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEnd {
    /// The store closed the stream.
    Closed,
    /// Subscribing or reading failed. The cache keeps its last snapshot.
    Failed(ReportGatewayError),
}

/// Pumps store snapshots into a [`ReportCache`].
pub struct ReportSync<G: ?Sized> {
    gateway: Arc<G>,
    cache: Arc<ReportCache>,
}

impl<G> ReportSync<G>
where
    G: ReportGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, cache: Arc<ReportCache>) -> Self {
        Self { gateway, cache }
    }

    /// Subscribe and apply snapshots until the stream ends or fails.
    ///
    /// Call again to resubscribe.
    pub async fn run(&self) -> SyncEnd {
        let mut stream = match self.gateway.subscribe().await {
            Ok(stream) => stream,
            Err(error) => {
                warn!(%error, "report subscription could not be established");
                return SyncEnd::Failed(error);
            }
        };
        info!("report subscription established");
        while let Some(item) = stream.next().await {
            match item {
                Ok(reports) => {
                    info!(count = reports.len(), "applying report snapshot");
                    self.cache.apply(reports);
                }
                Err(error) => {
                    warn!(%error, "report subscription failed; updates stopped");
                    return SyncEnd::Failed(error);
                }
            }
        }
        info!("report subscription closed by the store");
        SyncEnd::Closed
    }
}
