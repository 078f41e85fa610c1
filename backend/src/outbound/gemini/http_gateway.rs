//! Reqwest-backed Gemini gateway.
//!
//! Owns transport details only: request assembly, timeout and HTTP error
//! mapping, and decoding of the first candidate into domain values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::{
    ContentDto, GenerateContentRequest, GenerateContentResponse, GenerationConfigDto, PartDto,
};
use super::prompts::{
    GEOCODE_PROMPT, TRANSCRIPTION_PROMPT, chat_system_prompt, classification_prompt,
    classification_schema,
};
use crate::domain::ports::{AiGateway, AiGatewayError};
use crate::domain::{ChatContext, ChatReply, GeoPoint, ImageClassification, MediaPayload};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Credentials, endpoint and model choices for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: Url,
    pub vision_model: String,
    pub transcription_model: String,
    pub chat_model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            vision_model: DEFAULT_MODEL.to_owned(),
            transcription_model: DEFAULT_MODEL.to_owned(),
            chat_model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(30),
        })
    }
}

pub struct GeminiAiGateway {
    client: Client,
    config: GeminiConfig,
}

impl GeminiAiGateway {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> Result<Url, AiGatewayError> {
        model_endpoint(&self.config.base_url, model)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiGatewayError> {
        let endpoint = self.endpoint(model)?;
        debug!(model, "calling generateContent");
        let response = self
            .client
            .post(endpoint)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_response(body.as_ref())
    }

    async fn generate_text(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, AiGatewayError> {
        let response = self.generate(model, request).await?;
        response_text(&response)
    }
}

fn model_endpoint(base_url: &Url, model: &str) -> Result<Url, AiGatewayError> {
    let model = model.trim();
    if model.is_empty() || model.contains('/') {
        return Err(AiGatewayError::rejected(format!("invalid model name {model:?}")));
    }
    base_url
        .join(&format!("models/{model}:generateContent"))
        .map_err(|error| AiGatewayError::rejected(format!("invalid endpoint: {error}")))
}

fn classification_request(image: &MediaPayload) -> GenerateContentRequest {
    let mut request = GenerateContentRequest::from_parts(vec![
        PartDto::inline(image.mime_type(), image.data()),
        PartDto::text(classification_prompt()),
    ]);
    request.generation_config = Some(GenerationConfigDto {
        response_mime_type: "application/json",
        response_schema: classification_schema(),
    });
    request
}

fn transcription_request(audio: &MediaPayload) -> GenerateContentRequest {
    GenerateContentRequest::from_parts(vec![
        PartDto::inline(audio.mime_type(), audio.data()),
        PartDto::text(TRANSCRIPTION_PROMPT),
    ])
}

fn chat_request(
    message: &str,
    context: &ChatContext,
    near: Option<GeoPoint>,
) -> GenerateContentRequest {
    let mut request = GenerateContentRequest::from_parts(vec![PartDto::text(message)])
        .with_maps_grounding(near);
    request.system_instruction = Some(ContentDto::system(chat_system_prompt(context)));
    request
}

fn geocode_request(point: GeoPoint) -> GenerateContentRequest {
    GenerateContentRequest::from_parts(vec![PartDto::text(GEOCODE_PROMPT)])
        .with_maps_grounding(Some(point))
}

fn parse_response(body: &[u8]) -> Result<GenerateContentResponse, AiGatewayError> {
    serde_json::from_slice(body).map_err(|error| {
        AiGatewayError::decode(format!("invalid generateContent payload: {error}"))
    })
}

fn response_text(response: &GenerateContentResponse) -> Result<String, AiGatewayError> {
    if let Some(reason) = response.block_reason() {
        return Err(AiGatewayError::rejected(format!("prompt blocked: {reason}")));
    }
    response.text().ok_or_else(AiGatewayError::empty_response)
}

fn parse_classification(text: &str) -> Result<ImageClassification, AiGatewayError> {
    let raw: ImageClassification = serde_json::from_str(text).map_err(|error| {
        AiGatewayError::decode(format!("classification did not match its schema: {error}"))
    })?;
    Ok(ImageClassification {
        title: raw.title.trim().to_owned(),
        description: raw.description.trim().to_owned(),
        category: raw.category.trim().to_owned(),
        issue_type: raw.issue_type.trim().to_owned(),
    })
}

#[async_trait]
impl AiGateway for GeminiAiGateway {
    async fn classify_image(
        &self,
        image: &MediaPayload,
    ) -> Result<ImageClassification, AiGatewayError> {
        let text = self
            .generate_text(&self.config.vision_model, &classification_request(image))
            .await?;
        parse_classification(&text)
    }

    async fn transcribe_audio(&self, audio: &MediaPayload) -> Result<String, AiGatewayError> {
        self.generate_text(
            &self.config.transcription_model,
            &transcription_request(audio),
        )
        .await
    }

    async fn chat(
        &self,
        message: &str,
        context: &ChatContext,
        near: Option<GeoPoint>,
    ) -> Result<ChatReply, AiGatewayError> {
        let response = self
            .generate(&self.config.chat_model, &chat_request(message, context, near))
            .await?;
        Ok(ChatReply {
            text: response_text(&response)?,
            location_links: response.location_links(),
        })
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, AiGatewayError> {
        self.generate_text(&self.config.chat_model, &geocode_request(point))
            .await
    }
}

fn map_transport_error(error: reqwest::Error) -> AiGatewayError {
    if error.is_timeout() {
        AiGatewayError::timeout(error.to_string())
    } else {
        AiGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AiGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => AiGatewayError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AiGatewayError::timeout(message)
        }
        _ if status.is_client_error() => AiGatewayError::rejected(message),
        _ => AiGatewayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for request assembly and response mapping; no network.

    use super::*;
    use crate::domain::{MediaKind, Role, User, UserId};
    use rstest::rstest;
    use serde_json::json;

    fn context() -> ChatContext {
        let id = UserId::for_email("gemini@example.org");
        ChatContext {
            user: User::new(id, "Gem User", "gemini@example.org", Role::Citizen, None),
            reports: Vec::new(),
        }
    }

    fn point() -> GeoPoint {
        GeoPoint::new(12.9716, 77.5946).expect("valid point")
    }

    #[test]
    fn endpoint_targets_generate_content_for_model() {
        let base = Url::parse(DEFAULT_BASE_URL).expect("base url");
        let url = model_endpoint(&base, "gemini-2.5-flash").expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn model_names_with_slashes_are_refused() {
        let base = Url::parse(DEFAULT_BASE_URL).expect("base url");
        let err = model_endpoint(&base, "../files").expect_err("invalid model");
        assert!(matches!(err, AiGatewayError::Rejected { .. }));
    }

    #[test]
    fn classification_request_carries_image_and_schema() {
        let image = MediaPayload::new(MediaKind::Image, "aGVsbG8=", "image/png").expect("image");
        let body = serde_json::to_value(classification_request(&image)).expect("serialise");

        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["title", "description", "category", "issueType"])
        );
        assert!(body.get("tools").is_none());
    }

    #[rstest]
    #[case::located(Some(point()), true)]
    #[case::unlocated(None, false)]
    fn chat_request_grounds_on_maps(#[case] near: Option<GeoPoint>, #[case] has_lat_lng: bool) {
        let body =
            serde_json::to_value(chat_request("Any hospitals nearby?", &context(), near))
                .expect("serialise");

        assert_eq!(body["tools"], json!([{ "googleMaps": {} }]));
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .is_some_and(|text| text.contains("Gem User")));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Any hospitals nearby?");
        assert_eq!(body.get("toolConfig").is_some(), has_lat_lng);
        if has_lat_lng {
            assert_eq!(
                body["toolConfig"]["retrievalConfig"]["latLng"]["latitude"],
                json!(12.9716)
            );
        }
    }

    #[test]
    fn response_text_joins_parts_and_links_come_from_maps_chunks() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Try " }, { "text": "City Hospital." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "uri": "https://maps.example/a", "title": "City Hospital" } },
                        { "web": { "uri": "https://example.org" } },
                        { "maps": { "uri": "https://maps.example/a", "title": "Duplicate" } },
                        { "maps": { "uri": "https://maps.example/b" } }
                    ]
                }
            }]
        });
        let response = parse_response(body.to_string().as_bytes()).expect("decode");

        assert_eq!(response_text(&response).expect("text"), "Try City Hospital.");
        let links = response.location_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "City Hospital");
        assert_eq!(links[1].title, "https://maps.example/b");
    }

    #[test]
    fn response_without_text_is_empty() {
        let response = parse_response(br#"{"candidates":[{"content":{"parts":[]}}]}"#)
            .expect("decode");
        assert!(matches!(
            response_text(&response),
            Err(AiGatewayError::EmptyResponse)
        ));
    }

    #[test]
    fn blocked_prompt_is_rejected() {
        let response = parse_response(br#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .expect("decode");
        assert!(matches!(
            response_text(&response),
            Err(AiGatewayError::Rejected { .. })
        ));
    }

    #[test]
    fn classification_json_is_trimmed() {
        let parsed = parse_classification(
            r#"{"title":" Pothole on Main St ","description":"A deep hole.","category":"Roads","issueType":"Pothole"}"#,
        )
        .expect("classification");
        assert_eq!(parsed.title, "Pothole on Main St");
        assert_eq!(parsed.category, "Roads");
    }

    #[test]
    fn classification_missing_keys_is_a_decode_error() {
        let err = parse_classification(r#"{"title":"only a title"}"#).expect_err("incomplete");
        assert!(matches!(err, AiGatewayError::Decode { .. }));
    }

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, "RateLimited")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "Rejected")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Transport")]
    fn maps_http_statuses(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"error\":{\"message\":\"nope\"}}");
        let matched = match expected {
            "RateLimited" => matches!(error, AiGatewayError::RateLimited { .. }),
            "Timeout" => matches!(error, AiGatewayError::Timeout { .. }),
            "Rejected" => matches!(error, AiGatewayError::Rejected { .. }),
            "Transport" => matches!(error, AiGatewayError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} mapped to {error:?}");
    }

    #[test]
    fn body_preview_is_compacted_and_truncated() {
        let long = format!("a  b\n{}", "x".repeat(400));
        let preview = body_preview(long.as_bytes());
        assert!(preview.starts_with("a b "));
        assert!(preview.ends_with("..."));
    }
}
