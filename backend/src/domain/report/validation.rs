//! Single validation step turning citizen input into report fields.

use std::fmt;

use super::{Department, GeoPoint, Location};

/// Maximum accepted title length in characters.
pub const TITLE_MAX: usize = 120;
/// Maximum accepted description length in characters.
pub const DESCRIPTION_MAX: usize = 2_000;
/// Maximum accepted image payload length in bytes of encoded text.
///
/// Document stores cap records at roughly one megabyte; the rest of the
/// record needs headroom.
pub const IMAGE_MAX: usize = 900_000;
/// Issue type recorded when neither the citizen nor the classifier named one.
pub const UNCLASSIFIED_ISSUE: &str = "Unclassified";

/// Raw citizen input for a new report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub category: Option<Department>,
    pub issue_type: Option<String>,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub image: Option<String>,
}

/// Fields of a report that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReport {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: Department,
    pub(crate) issue_type: String,
    pub(crate) location: Location,
    pub(crate) image: Option<String>,
}

/// Reasons a report cannot be accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValidationError {
    MissingTitle,
    TitleTooLong { max: usize },
    MissingDescription,
    DescriptionTooLong { max: usize },
    MissingCategory,
    MissingLocation,
    InvalidCoordinates { lat: f64, lng: f64 },
    ImageTooLarge { max: usize },
    EmptyIdentifier,
    EmptyHistory,
    HistoryOutOfStep,
    InvalidReporter,
}

impl ReportValidationError {
    /// Input field the error refers to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingTitle | Self::TitleTooLong { .. } => Some("title"),
            Self::MissingDescription | Self::DescriptionTooLong { .. } => Some("description"),
            Self::MissingCategory => Some("category"),
            Self::MissingLocation | Self::InvalidCoordinates { .. } => Some("location"),
            Self::ImageTooLarge { .. } => Some("image"),
            Self::EmptyIdentifier
            | Self::EmptyHistory
            | Self::HistoryOutOfStep
            | Self::InvalidReporter => None,
        }
    }
}

impl fmt::Display for ReportValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "title is required"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::MissingDescription => write!(f, "description is required"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
            Self::MissingCategory => write!(f, "category is required"),
            Self::MissingLocation => write!(f, "location is required"),
            Self::InvalidCoordinates { lat, lng } => {
                write!(f, "coordinates out of range: lat={lat}, lng={lng}")
            }
            Self::ImageTooLarge { max } => write!(f, "image must be at most {max} bytes"),
            Self::EmptyIdentifier => write!(f, "identifier must not be empty"),
            Self::EmptyHistory => write!(f, "status history must not be empty"),
            Self::HistoryOutOfStep => {
                write!(f, "last status history entry must match the report status")
            }
            Self::InvalidReporter => write!(f, "reporter id must be a valid UUID"),
        }
    }
}

impl std::error::Error for ReportValidationError {}

fn required_text(
    raw: &str,
    max: usize,
    missing: ReportValidationError,
    too_long: ReportValidationError,
) -> Result<String, ReportValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(missing);
    }
    if trimmed.chars().count() > max {
        return Err(too_long);
    }
    Ok(trimmed.to_owned())
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl NewReport {
    /// Validate the input, producing either complete fields or the first
    /// problem found.
    ///
    /// A blank address becomes the coordinate label of the location and a
    /// blank issue type becomes [`UNCLASSIFIED_ISSUE`]; nothing else is
    /// defaulted.
    pub fn validate(self) -> Result<ValidatedReport, ReportValidationError> {
        let title = required_text(
            &self.title,
            TITLE_MAX,
            ReportValidationError::MissingTitle,
            ReportValidationError::TitleTooLong { max: TITLE_MAX },
        )?;
        let description = required_text(
            &self.description,
            DESCRIPTION_MAX,
            ReportValidationError::MissingDescription,
            ReportValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            },
        )?;
        let category = self.category.ok_or(ReportValidationError::MissingCategory)?;
        let point = self.location.ok_or(ReportValidationError::MissingLocation)?;
        let image = non_blank(self.image);
        if image.as_ref().is_some_and(|payload| payload.len() > IMAGE_MAX) {
            return Err(ReportValidationError::ImageTooLarge { max: IMAGE_MAX });
        }

        let address = non_blank(self.address).unwrap_or_else(|| point.coordinate_label());
        let issue_type =
            non_blank(self.issue_type).unwrap_or_else(|| UNCLASSIFIED_ISSUE.to_owned());

        Ok(ValidatedReport {
            title,
            description,
            category,
            issue_type,
            location: Location { point, address },
            image,
        })
    }
}
