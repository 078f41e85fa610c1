//! Firestore outbound adapter.
//!
//! Implements the `ReportGateway` port against the Firestore REST v1
//! documents API. Subscriptions poll a structured query and emit a snapshot
//! whenever the result set changes.

mod http_gateway;
mod values;

pub use http_gateway::{FirestoreConfig, FirestoreReportGateway};
