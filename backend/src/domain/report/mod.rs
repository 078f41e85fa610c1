//! Citizen issue reports and their audit trail.
//!
//! A [`Report`] can only be built through [`Report::open`] (fresh input that
//! already passed [`NewReport::validate`]) or from a stored
//! [`ReportRecord`], which is validated once on the way in. Either way the
//! status history is non-empty and its last entry matches the current
//! status; [`Report::record_status`] is the only mutation that touches
//! either.

mod location;
mod status;
mod validation;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{UserId, WorkerId};

pub use self::location::{GeoPoint, Location};
pub use self::status::{Department, Priority, ReportStatus, UnknownLabel};
pub use self::validation::{
    DESCRIPTION_MAX, IMAGE_MAX, NewReport, ReportValidationError, TITLE_MAX, UNCLASSIFIED_ISSUE,
    ValidatedReport,
};

/// Impact score assigned to every new report.
pub const INITIAL_IMPACT_SCORE: u32 = 25;

fn non_blank(raw: String) -> Result<String, ReportValidationError> {
    if raw.trim().is_empty() || raw.trim() != raw {
        return Err(ReportValidationError::EmptyIdentifier);
    }
    Ok(raw)
}

/// Public report reference, for example `INC-4F2A9C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct ReportId(String);

impl ReportId {
    /// Validate an identifier received from a client or the store.
    pub fn new(raw: impl Into<String>) -> Result<Self, ReportValidationError> {
        non_blank(raw.into()).map(Self)
    }

    /// Derive a reference from generated entropy.
    ///
    /// The trailing six hex digits are used because the leading digits of
    /// sequential test identifiers are all zero.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::ReportId;
    /// use uuid::Uuid;
    ///
    /// let id = ReportId::from_uuid(&Uuid::from_u128(0xabc123));
    /// assert_eq!(id.as_str(), "INC-ABC123");
    /// ```
    pub fn from_uuid(uuid: &Uuid) -> Self {
        let simple = uuid.simple().to_string().to_uppercase();
        let suffix = simple.get(simple.len() - 6..).unwrap_or(simple.as_str());
        Self(format!("INC-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ReportId> for String {
    fn from(value: ReportId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ReportId {
    type Error = ReportValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Document identifier assigned by the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ReportValidationError> {
        non_blank(raw.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StoreId> for String {
    fn from(value: StoreId) -> Self {
        value.0
    }
}

impl TryFrom<String> for StoreId {
    type Error = ReportValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: ReportStatus,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

/// A civic issue report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReportRecord", into = "ReportRecord")]
pub struct Report {
    id: ReportId,
    store_id: Option<StoreId>,
    title: String,
    description: String,
    category: Department,
    issue_type: String,
    status: ReportStatus,
    priority: Priority,
    location: Location,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    reporter_id: UserId,
    impact_score: u32,
    worker_id: Option<WorkerId>,
    status_history: Vec<StatusHistoryEntry>,
}

impl Report {
    /// Open a new report in `NEW` with a genesis history entry.
    pub fn open(
        id: ReportId,
        fields: ValidatedReport,
        reporter_id: UserId,
        now: DateTime<Utc>,
        genesis_note: impl Into<String>,
    ) -> Self {
        let ValidatedReport {
            title,
            description,
            category,
            issue_type,
            location,
            image,
        } = fields;
        Self {
            id,
            store_id: None,
            title,
            description,
            category,
            issue_type,
            status: ReportStatus::New,
            priority: Priority::default(),
            location,
            image,
            created_at: now,
            updated_at: now,
            reporter_id,
            impact_score: INITIAL_IMPACT_SCORE,
            worker_id: None,
            status_history: vec![StatusHistoryEntry {
                status: ReportStatus::New,
                timestamp: now,
                note: genesis_note.into(),
            }],
        }
    }

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    /// Durable-store reference, present once the store has echoed the record.
    pub fn store_id(&self) -> Option<&StoreId> {
        self.store_id.as_ref()
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn category(&self) -> Department {
        self.category
    }

    pub fn issue_type(&self) -> &str {
        self.issue_type.as_str()
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn reporter_id(&self) -> &UserId {
        &self.reporter_id
    }

    pub fn impact_score(&self) -> u32 {
        self.impact_score
    }

    pub fn worker_id(&self) -> Option<&WorkerId> {
        self.worker_id.as_ref()
    }

    /// Ordered audit trail; never empty.
    pub fn status_history(&self) -> &[StatusHistoryEntry] {
        &self.status_history
    }

    /// Whether the report has ever been marked verified.
    pub fn was_ever_verified(&self) -> bool {
        self.status_history
            .iter()
            .any(|entry| entry.status == ReportStatus::Verified)
    }

    /// Attach the store reference returned by a create call.
    pub fn with_store_id(mut self, store_id: StoreId) -> Self {
        self.store_id = Some(store_id);
        self
    }

    /// Move to `status`, appending the matching history entry.
    pub(crate) fn record_status(
        &mut self,
        status: ReportStatus,
        note: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        self.updated_at = at;
        self.status_history.push(StatusHistoryEntry {
            status,
            timestamp: at,
            note: note.into(),
        });
    }

    pub(crate) fn set_worker(&mut self, worker_id: Option<WorkerId>) {
        self.worker_id = worker_id;
    }

    /// Fields touched by lifecycle operations, ready for a partial update.
    pub fn lifecycle_patch(&self) -> ReportPatch {
        ReportPatch {
            status: self.status,
            updated_at: self.updated_at,
            status_history: self.status_history.clone(),
            worker_id: self.worker_id.clone(),
        }
    }
}

impl Report {
    /// Apply a partial update, re-checking the history invariant.
    pub fn patched(self, patch: &ReportPatch) -> Result<Self, ReportValidationError> {
        let mut record = ReportRecord::from(self);
        record.status = patch.status;
        record.updated_at = patch.updated_at;
        record.status_history = patch.status_history.clone();
        record.worker_id = patch.worker_id.clone().map(String::from);
        Self::try_from(record)
    }
}

/// Partial update written back to the store after a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportPatch {
    pub status: ReportStatus,
    pub updated_at: DateTime<Utc>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub worker_id: Option<WorkerId>,
}

/// Location as stored: coordinates and address side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationRecord {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

/// Serialised report shape shared by the store and the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = Report)]
pub struct ReportRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: Department,
    pub issue_type: String,
    pub status: ReportStatus,
    #[serde(default)]
    pub priority: Priority,
    pub location: LocationRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reporter_id: String,
    pub impact_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl From<Report> for ReportRecord {
    fn from(value: Report) -> Self {
        Self {
            id: value.id.into(),
            store_id: value.store_id.map(String::from),
            title: value.title,
            description: value.description,
            category: value.category,
            issue_type: value.issue_type,
            status: value.status,
            priority: value.priority,
            location: LocationRecord {
                lat: value.location.point.lat(),
                lng: value.location.point.lng(),
                address: value.location.address,
            },
            image: value.image,
            created_at: value.created_at,
            updated_at: value.updated_at,
            reporter_id: value.reporter_id.into(),
            impact_score: value.impact_score,
            worker_id: value.worker_id.map(String::from),
            status_history: value.status_history,
        }
    }
}

impl TryFrom<ReportRecord> for Report {
    type Error = ReportValidationError;

    fn try_from(value: ReportRecord) -> Result<Self, Self::Error> {
        let last = value
            .status_history
            .last()
            .ok_or(ReportValidationError::EmptyHistory)?;
        if last.status != value.status {
            return Err(ReportValidationError::HistoryOutOfStep);
        }
        let point = GeoPoint::new(value.location.lat, value.location.lng)?;
        let reporter_id =
            UserId::new(&value.reporter_id).map_err(|_| ReportValidationError::InvalidReporter)?;
        let worker_id = value
            .worker_id
            .map(WorkerId::new)
            .transpose()
            .map_err(|_| ReportValidationError::EmptyIdentifier)?;

        Ok(Self {
            id: ReportId::new(value.id)?,
            store_id: value.store_id.map(StoreId::new).transpose()?,
            title: value.title,
            description: value.description,
            category: value.category,
            issue_type: value.issue_type,
            status: value.status,
            priority: value.priority,
            location: Location {
                point,
                address: value.location.address,
            },
            image: value.image,
            created_at: value.created_at,
            updated_at: value.updated_at,
            reporter_id,
            impact_score: value.impact_score,
            worker_id,
            status_history: value.status_history,
        })
    }
}

#[cfg(test)]
mod tests;
