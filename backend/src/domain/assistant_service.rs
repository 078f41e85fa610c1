//! AI assistant service.
//!
//! Wraps the [`AiGateway`] with the degradation policy: classification and
//! geocoding fall back quietly, transcription and chat surface
//! `ServiceUnavailable`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::ports::{AiGateway, AiGatewayError, ProfileStore, ReportAssistant};
use super::profile_book::ProfileBook;
use super::{
    ChatContext, ChatReply, Error, GeoPoint, ImageClassification, MediaPayload, ReportCache,
    UserId,
};

/// Longest chat message accepted, in characters.
pub const CHAT_MESSAGE_MAX: usize = 2_000;

fn unavailable(operation: &str, error: &AiGatewayError) -> Error {
    Error::service_unavailable(format!("{operation} is unavailable right now: {error}"))
}

/// Gateway-backed assistant features that need citizen or report context.
pub struct AssistantService<A: ?Sized, S: ?Sized> {
    gateway: Arc<A>,
    profiles: Arc<ProfileBook<S>>,
    cache: Arc<ReportCache>,
}

impl<A, S> AssistantService<A, S>
where
    A: AiGateway + ?Sized,
    S: ProfileStore + ?Sized,
{
    pub fn new(gateway: Arc<A>, profiles: Arc<ProfileBook<S>>, cache: Arc<ReportCache>) -> Self {
        Self {
            gateway,
            profiles,
            cache,
        }
    }
}

#[async_trait]
impl<A, S> ReportAssistant for AssistantService<A, S>
where
    A: AiGateway + ?Sized,
    S: ProfileStore + ?Sized,
{
    async fn classify_image(
        &self,
        image: MediaPayload,
    ) -> Result<Option<ImageClassification>, Error> {
        match self.gateway.classify_image(&image).await {
            Ok(classification) => {
                info!(
                    category = classification.category.as_str(),
                    matched = classification.department().is_some(),
                    "image classified"
                );
                Ok(Some(classification))
            }
            Err(error) => {
                warn!(%error, "image classification failed; continuing without suggestions");
                Ok(None)
            }
        }
    }

    async fn transcribe(&self, audio: MediaPayload) -> Result<String, Error> {
        self.gateway
            .transcribe_audio(&audio)
            .await
            .map_err(|error| {
                warn!(%error, "transcription failed");
                unavailable("transcription", &error)
            })
    }

    async fn chat(
        &self,
        user_id: &UserId,
        message: &str,
        near: Option<GeoPoint>,
    ) -> Result<ChatReply, Error> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::invalid_request("message must not be empty")
                .with_details(serde_json::json!({ "field": "message" })));
        }
        if message.chars().count() > CHAT_MESSAGE_MAX {
            return Err(Error::invalid_request(format!(
                "message must be at most {CHAT_MESSAGE_MAX} characters"
            ))
            .with_details(serde_json::json!({ "field": "message" })));
        }
        let user = self.profiles.read(user_id).await?.user;
        let context = ChatContext {
            reports: self.cache.filed_by(user_id),
            user,
        };
        self.gateway
            .chat(message, &context, near)
            .await
            .map_err(|error| {
                warn!(%error, "assistant chat failed");
                unavailable("the assistant", &error)
            })
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, Error> {
        match self.gateway.reverse_geocode(point).await {
            Ok(address) if !address.trim().is_empty() => Ok(address.trim().to_owned()),
            Ok(_) => Ok(point.coordinate_label()),
            Err(error) => {
                warn!(%error, "reverse geocoding failed; using coordinates");
                Ok(point.coordinate_label())
            }
        }
    }
}
