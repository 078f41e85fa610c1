//! Report store kept in process memory.
//!
//! Behaves like the remote store from the caller's point of view: it assigns
//! document ids, keeps the collection ordered by `createdAt` descending and
//! pushes the full collection to every subscriber after each write.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::{
    IdGenerator, ReportGateway, ReportGatewayError, ReportSnapshot, SnapshotStream,
};
use crate::domain::{Report, ReportPatch, StoreId};

pub struct InMemoryReportGateway {
    ids: Arc<dyn IdGenerator>,
    reports: watch::Sender<ReportSnapshot>,
}

impl InMemoryReportGateway {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ids,
            reports: watch::Sender::new(Vec::new()),
        }
    }

    /// Current contents, newest first.
    pub fn reports(&self) -> ReportSnapshot {
        self.reports.borrow().clone()
    }
}

#[async_trait]
impl ReportGateway for InMemoryReportGateway {
    async fn subscribe(&self) -> Result<SnapshotStream, ReportGatewayError> {
        let rx = self.reports.subscribe();
        let snapshots = stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let snapshot = rx.borrow_and_update().clone();
            Some((Ok(snapshot), (rx, false)))
        });
        Ok(snapshots.boxed())
    }

    async fn create(&self, report: &Report) -> Result<StoreId, ReportGatewayError> {
        let store_id = StoreId::new(format!("doc-{}", self.ids.next_uuid().simple()))
            .map_err(|err| ReportGatewayError::query(err.to_string()))?;
        let stored = report.clone().with_store_id(store_id.clone());
        self.reports.send_modify(|reports| {
            let at = reports
                .iter()
                .position(|existing| existing.created_at() <= stored.created_at())
                .unwrap_or(reports.len());
            reports.insert(at, stored);
        });
        debug!(%store_id, "report stored in memory");
        Ok(store_id)
    }

    async fn update(
        &self,
        store_id: &StoreId,
        patch: &ReportPatch,
    ) -> Result<(), ReportGatewayError> {
        let mut outcome = Err(ReportGatewayError::missing(store_id.as_str()));
        self.reports.send_if_modified(|reports| {
            let Some(slot) = reports
                .iter_mut()
                .find(|report| report.store_id() == Some(store_id))
            else {
                return false;
            };
            match slot.clone().patched(patch) {
                Ok(updated) => {
                    *slot = updated;
                    outcome = Ok(());
                    true
                }
                Err(err) => {
                    outcome = Err(ReportGatewayError::decode(err.to_string()));
                    false
                }
            }
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SequentialIdGenerator;
    use crate::domain::{ReportStatus, UserId};
    use crate::test_support::persisted_report;
    use rstest::rstest;

    fn gateway() -> InMemoryReportGateway {
        InMemoryReportGateway::new(Arc::new(SequentialIdGenerator::default()))
    }

    fn reporter() -> UserId {
        UserId::for_email("memory@example.org")
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_see_current_state_then_every_write() {
        let gateway = gateway();
        let mut stream = gateway.subscribe().await.expect("subscribe");

        let first = stream.next().await.expect("initial").expect("ok");
        assert!(first.is_empty());

        let store_id = gateway
            .create(&persisted_report(&reporter(), 1, ReportStatus::New))
            .await
            .expect("create");
        assert_eq!(store_id.as_str(), "doc-00000000000000000000000000000001");

        let second = stream.next().await.expect("after create").expect("ok");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].store_id(), Some(&store_id));
    }

    #[rstest]
    #[tokio::test]
    async fn update_applies_patch_to_the_document() {
        let gateway = gateway();
        let store_id = gateway
            .create(&persisted_report(&reporter(), 1, ReportStatus::New))
            .await
            .expect("create");
        let mut moved = persisted_report(&reporter(), 1, ReportStatus::Resolved);
        moved = moved.with_store_id(store_id.clone());

        gateway
            .update(&store_id, &moved.lifecycle_patch())
            .await
            .expect("update");

        assert_eq!(gateway.reports()[0].status(), ReportStatus::Resolved);
    }

    #[rstest]
    #[tokio::test]
    async fn update_of_unknown_document_is_missing() {
        let gateway = gateway();
        let report = persisted_report(&reporter(), 1, ReportStatus::New);
        let store_id = StoreId::new("doc-404").expect("id");

        let err = gateway
            .update(&store_id, &report.lifecycle_patch())
            .await
            .expect_err("missing");

        assert_eq!(err, ReportGatewayError::missing("doc-404"));
    }
}
