//! Field workers and the dispatch roster.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Department;

/// Roster identifier such as `W101`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerId(String);

/// Raised when a worker identifier is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyWorkerId;

impl fmt::Display for EmptyWorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("worker id must not be empty")
    }
}

impl std::error::Error for EmptyWorkerId {}

impl WorkerId {
    /// Validated worker id; blank input is rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyWorkerId> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyWorkerId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WorkerId> for String {
    fn from(value: WorkerId) -> Self {
        value.0
    }
}

impl TryFrom<String> for WorkerId {
    type Error = EmptyWorkerId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Availability of a field worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Available,
    Busy,
}

/// Municipal field worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub department: Department,
    pub status: WorkerStatus,
}

/// The set of field workers known to dispatch.
///
/// # Examples
/// ```
/// use backend::domain::{Department, Roster};
///
/// let roster = Roster::standard();
/// assert_eq!(roster.available_in(Some(Department::Water)).count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    workers: Vec<Worker>,
}

impl Roster {
    /// Roster holding exactly `workers`, in the given order.
    pub fn new(workers: Vec<Worker>) -> Self {
        Self { workers }
    }

    /// Roster seeded with one worker per department, all available.
    pub fn standard() -> Self {
        Self::new(super::catalog::standard_workers())
    }

    /// Every worker on the roster regardless of status.
    pub fn all(&self) -> &[Worker] {
        &self.workers
    }

    /// Worker registered under `id`, if any.
    pub fn find(&self, id: &WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|worker| &worker.id == id)
    }

    /// Available workers, optionally restricted to one department.
    pub fn available_in(&self, department: Option<Department>) -> impl Iterator<Item = &Worker> {
        self.workers.iter().filter(move |worker| {
            worker.status == WorkerStatus::Available
                && department.is_none_or(|wanted| worker.department == wanted)
        })
    }

    /// Set a worker's availability. Returns `false` for unknown workers.
    pub(crate) fn set_status(&mut self, id: &WorkerId, status: WorkerStatus) -> bool {
        match self.workers.iter_mut().find(|worker| &worker.id == id) {
            Some(worker) => {
                worker.status = status;
                true
            }
            None => false,
        }
    }
}
