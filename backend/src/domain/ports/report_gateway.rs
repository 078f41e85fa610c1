//! Port for the durable report store.
//!
//! The store is the source of truth. Readers subscribe and receive the full
//! result set, newest first, every time anything changes; they never patch
//! their view incrementally.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::domain::{Report, ReportPatch, StoreId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by report store adapters.
    pub enum ReportGatewayError {
        /// The store could not be reached.
        Connection { message: String } =>
            "report store connection failed: {message}",
        /// The store refused the operation for the configured credentials.
        PermissionDenied { message: String } =>
            "report store denied access: {message}",
        /// The referenced document does not exist.
        Missing { store_id: String } =>
            "report store document {store_id} not found",
        /// A stored document could not be decoded.
        Decode { message: String } =>
            "report store returned an unreadable document: {message}",
        /// Any other store-side failure.
        Query { message: String } =>
            "report store query failed: {message}",
    }
}

/// Full snapshot delivered by a subscription.
pub type ReportSnapshot = Vec<Report>;

/// Stream of snapshots. Dropping it unsubscribes.
pub type SnapshotStream = BoxStream<'static, Result<ReportSnapshot, ReportGatewayError>>;

/// Port to the shared report store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportGateway: Send + Sync {
    /// Subscribe to the live collection. The first item is the current
    /// state.
    async fn subscribe(&self) -> Result<SnapshotStream, ReportGatewayError>;

    /// Store a new report and return the document id the store assigned.
    async fn create(&self, report: &Report) -> Result<StoreId, ReportGatewayError>;

    /// Apply a partial update to an existing document.
    async fn update(
        &self,
        store_id: &StoreId,
        patch: &ReportPatch,
    ) -> Result<(), ReportGatewayError>;
}

/// Fixture implementation for tests that do not exercise the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReportGateway;

#[async_trait]
impl ReportGateway for FixtureReportGateway {
    async fn subscribe(&self) -> Result<SnapshotStream, ReportGatewayError> {
        Ok(stream::once(async { Ok(Vec::new()) }).boxed())
    }

    async fn create(&self, _report: &Report) -> Result<StoreId, ReportGatewayError> {
        StoreId::new("fixture-doc").map_err(|err| ReportGatewayError::query(err.to_string()))
    }

    async fn update(
        &self,
        _store_id: &StoreId,
        _patch: &ReportPatch,
    ) -> Result<(), ReportGatewayError> {
        Ok(())
    }
}
