//! AI assistant handlers.
//!
//! ```text
//! POST /api/v1/assistant/classify {"data":"data:image/jpeg;base64,...","mimeType":"image/jpeg"}
//! POST /api/v1/assistant/transcribe {"data":"...","mimeType":"audio/webm"}
//! POST /api/v1/assistant/chat {"message":"Any water cuts near me?","lat":12.97,"lng":77.59}
//! GET /api/v1/assistant/geocode?lat=12.97&lng=77.59
//! ```
//!
//! Media is validated here, before anything is sent to the AI service.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::service_errors::media_invalid;
use crate::domain::{ChatReply, Department, Error, ImageClassification, MediaKind, MediaPayload};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_point, parse_point};

/// Base64 media, optionally as a `data:` URL.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub data: String,
    /// Ignored when `data` is a `data:` URL.
    #[serde(default)]
    pub mime_type: String,
}

impl MediaRequest {
    fn into_payload(self, kind: MediaKind) -> Result<MediaPayload, Error> {
        MediaPayload::new(kind, &self.data, &self.mime_type).map_err(media_invalid)
    }
}

/// Suggested report fields. `suggestion` is absent when the assistant is
/// unavailable and the form must be filled by hand.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    pub suggestion: Option<ImageClassification>,
    /// Department the suggested category resolves to, if any.
    pub department: Option<Department>,
}

impl From<Option<ImageClassification>> for ClassificationResponse {
    fn from(value: Option<ImageClassification>) -> Self {
        let department = value
            .as_ref()
            .and_then(ImageClassification::department);
        Self {
            suggestion: value,
            department,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranscriptionResponse {
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeocodeResponse {
    pub address: String,
}

/// Suggest title, description and category for a photo.
#[utoipa::path(
    post,
    path = "/api/v1/assistant/classify",
    request_body = MediaRequest,
    responses(
        (status = 200, description = "Suggestion, possibly empty", body = ClassificationResponse),
        (status = 400, description = "Invalid media", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["assistant"],
    operation_id = "classifyImage"
)]
#[post("/assistant/classify")]
pub async fn classify_image(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<MediaRequest>,
) -> ApiResult<web::Json<ClassificationResponse>> {
    session.require_user_id()?;
    let image = payload.into_inner().into_payload(MediaKind::Image)?;
    let suggestion = state.assistant.classify_image(image).await?;
    Ok(web::Json(ClassificationResponse::from(suggestion)))
}

/// Transcribe a voice note.
#[utoipa::path(
    post,
    path = "/api/v1/assistant/transcribe",
    request_body = MediaRequest,
    responses(
        (status = 200, description = "Transcript", body = TranscriptionResponse),
        (status = 400, description = "Invalid media", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Assistant unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["assistant"],
    operation_id = "transcribeAudio"
)]
#[post("/assistant/transcribe")]
pub async fn transcribe(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<MediaRequest>,
) -> ApiResult<web::Json<TranscriptionResponse>> {
    session.require_user_id()?;
    let audio = payload.into_inner().into_payload(MediaKind::Audio)?;
    let text = state.assistant.transcribe(audio).await?;
    Ok(web::Json(TranscriptionResponse { text }))
}

/// Ask the civic assistant, optionally grounded near a location.
#[utoipa::path(
    post,
    path = "/api/v1/assistant/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply", body = ChatReply),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Assistant unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["assistant"],
    operation_id = "chat"
)]
#[post("/assistant/chat")]
pub async fn chat(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChatRequest>,
) -> ApiResult<web::Json<ChatReply>> {
    let user_id = session.require_user_id()?;
    let ChatRequest { message, lat, lng } = payload.into_inner();
    let near = parse_optional_point(lat, lng, FieldName::new("location"))?;
    let reply = state.assistant.chat(&user_id, &message, near).await?;
    Ok(web::Json(reply))
}

/// Describe the address at a point, falling back to the coordinates.
#[utoipa::path(
    get,
    path = "/api/v1/assistant/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Address", body = GeocodeResponse),
        (status = 400, description = "Invalid coordinates", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["assistant"],
    operation_id = "reverseGeocode"
)]
#[get("/assistant/geocode")]
pub async fn reverse_geocode(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<GeocodeQuery>,
) -> ApiResult<web::Json<GeocodeResponse>> {
    session.require_user_id()?;
    let point = parse_point(query.lat, query.lng, FieldName::new("location"))?;
    let address = state.assistant.reverse_geocode(point).await?;
    Ok(web::Json(GeocodeResponse { address }))
}

#[cfg(test)]
#[path = "assistant_tests.rs"]
mod tests;
