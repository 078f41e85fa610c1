//! Report classification enums: status, department and priority.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Position of a report in the triage state machine.
///
/// The main path is `NEW → IN_PROGRESS → RESOLVED → VERIFIED`. `ESCALATED`
/// and `CLOSED` are side branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    New,
    InProgress,
    Resolved,
    Verified,
    Closed,
    Escalated,
}

impl ReportStatus {
    /// Every status in board order.
    pub const ALL: [Self; 6] = [
        Self::New,
        Self::InProgress,
        Self::Resolved,
        Self::Verified,
        Self::Closed,
        Self::Escalated,
    ];

    /// Wire label, matching the serialised form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Verified => "VERIFIED",
            Self::Closed => "CLOSED",
            Self::Escalated => "ESCALATED",
        }
    }

    /// Whether no further transitions are expected from this status.
    ///
    /// Informational only; the lifecycle engine does not refuse transitions
    /// out of terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Closed)
    }

    /// Whether a field worker attached to the report is no longer needed.
    pub fn releases_worker(self) -> bool {
        matches!(self, Self::Resolved | Self::Verified | Self::Closed)
    }

    /// Whether the report still awaits work.
    pub fn is_active(self) -> bool {
        matches!(self, Self::New | Self::InProgress)
    }

    /// Whether the report counts as resolved for performance figures.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved | Self::Verified)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLabel(s.to_owned()))
    }
}

/// Municipal department responsible for a category of issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Department {
    #[serde(rename = "Electricity")]
    Electricity,
    #[serde(rename = "Sanitation")]
    Sanitation,
    #[serde(rename = "Roads & Infrastructure")]
    Roads,
    #[serde(rename = "Water Supply")]
    Water,
    #[serde(rename = "Parks & Recreation")]
    Parks,
}

impl Department {
    pub const ALL: [Self; 5] = [
        Self::Electricity,
        Self::Sanitation,
        Self::Roads,
        Self::Water,
        Self::Parks,
    ];

    /// Human-readable label, matching the serialised form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Electricity => "Electricity",
            Self::Sanitation => "Sanitation",
            Self::Roads => "Roads & Infrastructure",
            Self::Water => "Water Supply",
            Self::Parks => "Parks & Recreation",
        }
    }

    /// Match a free-text label, typically produced by an AI classifier.
    ///
    /// The comparison is case-insensitive and succeeds when either string
    /// contains the other, so `"roads"` and `"Water Supply Division"` both
    /// resolve.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Department;
    ///
    /// assert_eq!(Department::match_label("water"), Some(Department::Water));
    /// assert_eq!(Department::match_label("Street lighting"), None);
    /// ```
    pub fn match_label(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|department| {
            let label = department.label().to_lowercase();
            label.contains(&needle) || needle.contains(&label)
        })
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Department {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|department| department.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLabel(s.to_owned()))
    }
}

/// Triage priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Raised when parsing a status or department label fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown label: {}", self.0)
    }
}

impl std::error::Error for UnknownLabel {}
