//! Wire-level message definitions for the report feed.

use serde::{Deserialize, Serialize};

use crate::domain::Report;

/// Full view of the report collection, pushed on connect and on every change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFeedMessage<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub reports: &'a [Report],
}

impl<'a> ReportFeedMessage<'a> {
    pub fn snapshot(reports: &'a [Report]) -> Self {
        Self {
            kind: "snapshot",
            reports,
        }
    }
}

/// Requests a client may send over the feed.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedRequest {
    /// Resend the current snapshot.
    Refresh,
}
