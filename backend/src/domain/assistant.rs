//! Value types exchanged with the AI assistant.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Department, Report, User};

/// Largest decoded media payload accepted, in bytes.
pub const MEDIA_MAX_BYTES: usize = 8 * 1024 * 1024;

/// What a media payload is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    fn mime_prefix(self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Audio => "audio/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaValidationError {
    UnsupportedMimeType { mime_type: String },
    Empty,
    NotBase64,
    TooLarge { max: usize },
}

impl fmt::Display for MediaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedMimeType { mime_type } => {
                write!(f, "unsupported media type {mime_type}")
            }
            Self::Empty => write!(f, "media payload must not be empty"),
            Self::NotBase64 => write!(f, "media payload must be base64 encoded"),
            Self::TooLarge { max } => write!(f, "media payload must be at most {max} bytes"),
        }
    }
}

impl std::error::Error for MediaValidationError {}

/// Base64 media ready to forward to the AI service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    data: String,
    mime_type: String,
}

impl MediaPayload {
    /// Validate a payload. A `data:` URL prefix is stripped, and its media
    /// type wins over `mime_type` when present.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{MediaKind, MediaPayload};
    ///
    /// let payload = MediaPayload::new(MediaKind::Image, "data:image/png;base64,aGVsbG8=", "")
    ///     .expect("valid payload");
    /// assert_eq!(payload.mime_type(), "image/png");
    /// assert_eq!(payload.data(), "aGVsbG8=");
    /// ```
    pub fn new(kind: MediaKind, data: &str, mime_type: &str) -> Result<Self, MediaValidationError> {
        let (data, mime_type) = split_data_url(data.trim(), mime_type.trim());
        if !mime_type.starts_with(kind.mime_prefix()) {
            return Err(MediaValidationError::UnsupportedMimeType {
                mime_type: mime_type.to_owned(),
            });
        }
        if data.is_empty() {
            return Err(MediaValidationError::Empty);
        }
        if data.len() / 4 * 3 > MEDIA_MAX_BYTES {
            return Err(MediaValidationError::TooLarge {
                max: MEDIA_MAX_BYTES,
            });
        }
        STANDARD
            .decode(data)
            .map_err(|_| MediaValidationError::NotBase64)?;
        Ok(Self {
            data: data.to_owned(),
            mime_type: mime_type.to_owned(),
        })
    }

    pub fn data(&self) -> &str {
        self.data.as_str()
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }
}

fn split_data_url<'a>(data: &'a str, mime_type: &'a str) -> (&'a str, &'a str) {
    let Some(rest) = data.strip_prefix("data:") else {
        return (data, mime_type);
    };
    match rest.split_once(";base64,") {
        Some((declared, payload)) => (payload, declared),
        None => (data, mime_type),
    }
}

/// Suggested report fields derived from a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageClassification {
    pub title: String,
    pub description: String,
    /// Free-text category as returned by the model.
    pub category: String,
    pub issue_type: String,
}

impl ImageClassification {
    /// Department the free-text category resolves to, if any.
    pub fn department(&self) -> Option<Department> {
        Department::match_label(&self.category)
    }
}

/// Background the assistant receives with every chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub user: User,
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationLink {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub text: String,
    pub location_links: Vec<LocationLink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MediaKind::Audio, "aGVsbG8=", "audio/webm", true)]
    #[case(MediaKind::Audio, "aGVsbG8=", "image/png", false)]
    #[case(MediaKind::Image, "not base64!", "image/jpeg", false)]
    #[case(MediaKind::Image, "", "image/jpeg", false)]
    #[case(MediaKind::Image, "data:audio/webm;base64,aGVsbG8=", "image/png", false)]
    fn validates_payloads(
        #[case] kind: MediaKind,
        #[case] data: &str,
        #[case] mime: &str,
        #[case] accepted: bool,
    ) {
        assert_eq!(MediaPayload::new(kind, data, mime).is_ok(), accepted);
    }

    #[rstest]
    #[case("Roads", Some(Department::Roads))]
    #[case("WATER SUPPLY DEPARTMENT", Some(Department::Water))]
    #[case("Potholes", None)]
    fn classification_category_is_fuzzy_matched(
        #[case] category: &str,
        #[case] expected: Option<Department>,
    ) {
        let classification = ImageClassification {
            title: "t".into(),
            description: "d".into(),
            category: category.into(),
            issue_type: "i".into(),
        };
        assert_eq!(classification.department(), expected);
    }
}
