//! Port for the generative AI service.

use async_trait::async_trait;

use crate::domain::{ChatContext, ChatReply, GeoPoint, ImageClassification, MediaPayload};

use super::define_port_error;

define_port_error! {
    /// Errors raised by AI gateway adapters.
    pub enum AiGatewayError {
        /// The request did not complete in time.
        Timeout { message: String } =>
            "ai service timed out: {message}",
        /// Network or TLS failure before a response arrived.
        Transport { message: String } =>
            "ai service transport failed: {message}",
        /// The service is throttling this client.
        RateLimited { message: String } =>
            "ai service rate limited the request: {message}",
        /// The service rejected the request.
        Rejected { message: String } =>
            "ai service rejected the request: {message}",
        /// The response could not be interpreted.
        Decode { message: String } =>
            "ai service response was unreadable: {message}",
        /// The service answered without usable content.
        EmptyResponse =>
            "ai service returned no content",
    }
}

/// Port to the generative model behind the assistant features.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Suggest report fields for a photo.
    async fn classify_image(
        &self,
        image: &MediaPayload,
    ) -> Result<ImageClassification, AiGatewayError>;

    /// Transcribe a voice note to text.
    async fn transcribe_audio(&self, audio: &MediaPayload) -> Result<String, AiGatewayError>;

    /// Answer a citizen's message, optionally grounded near `near`.
    async fn chat(
        &self,
        message: &str,
        context: &ChatContext,
        near: Option<GeoPoint>,
    ) -> Result<ChatReply, AiGatewayError>;

    /// Describe the address at `point`.
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, AiGatewayError>;
}

/// Stand-in used when no AI credentials are configured: every call fails
/// with [`AiGatewayError::Rejected`], which the assistant degrades per
/// operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAiGateway;

#[async_trait]
impl AiGateway for DisabledAiGateway {
    async fn classify_image(
        &self,
        _image: &MediaPayload,
    ) -> Result<ImageClassification, AiGatewayError> {
        Err(AiGatewayError::rejected("ai service is not configured"))
    }

    async fn transcribe_audio(&self, _audio: &MediaPayload) -> Result<String, AiGatewayError> {
        Err(AiGatewayError::rejected("ai service is not configured"))
    }

    async fn chat(
        &self,
        _message: &str,
        _context: &ChatContext,
        _near: Option<GeoPoint>,
    ) -> Result<ChatReply, AiGatewayError> {
        Err(AiGatewayError::rejected("ai service is not configured"))
    }

    async fn reverse_geocode(&self, _point: GeoPoint) -> Result<String, AiGatewayError> {
        Err(AiGatewayError::rejected("ai service is not configured"))
    }
}
