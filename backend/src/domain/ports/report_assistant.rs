//! Driving port for AI-assisted reporting.
//!
//! Each operation degrades differently when the AI service fails; see the
//! method docs.

use async_trait::async_trait;

use crate::domain::{ChatReply, Error, GeoPoint, ImageClassification, MediaPayload, UserId};

/// Assistant operations the HTTP layer calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportAssistant: Send + Sync {
    /// Suggest report fields for a photo. `None` when the service is
    /// unavailable, so the citizen fills the form by hand.
    async fn classify_image(
        &self,
        image: MediaPayload,
    ) -> Result<Option<ImageClassification>, Error>;

    /// Transcribe a voice note. Fails with `ServiceUnavailable` when the
    /// service is down.
    async fn transcribe(&self, audio: MediaPayload) -> Result<String, Error>;

    /// Answer a chat message in the context of the citizen's profile and
    /// reports. Fails with `ServiceUnavailable` when the service is down.
    async fn chat(
        &self,
        user_id: &UserId,
        message: &str,
        near: Option<GeoPoint>,
    ) -> Result<ChatReply, Error>;

    /// Describe the address at `point`, falling back to the coordinate
    /// label.
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, Error>;
}
