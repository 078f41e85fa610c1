//! Wire shapes for `generateContent` requests and responses.
//!
//! Requests are assembled from these DTOs and responses are decoded into
//! them before anything is mapped into domain values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{GeoPoint, LocationLink};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) system_instruction: Option<ContentDto>,
    pub(super) contents: Vec<ContentDto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) tools: Vec<ToolDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) tool_config: Option<ToolConfigDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) generation_config: Option<GenerationConfigDto>,
}

impl GenerateContentRequest {
    pub(super) fn from_parts(parts: Vec<PartDto>) -> Self {
        Self {
            system_instruction: None,
            contents: vec![ContentDto::user(parts)],
            tools: Vec::new(),
            tool_config: None,
            generation_config: None,
        }
    }

    /// Enable Google Maps grounding, anchored at `near` when known.
    pub(super) fn with_maps_grounding(mut self, near: Option<GeoPoint>) -> Self {
        self.tools.push(ToolDto {
            google_maps: serde_json::Map::new(),
        });
        self.tool_config = near.map(|point| ToolConfigDto {
            retrieval_config: RetrievalConfigDto {
                lat_lng: LatLngDto {
                    latitude: point.lat(),
                    longitude: point.lng(),
                },
            },
        });
        self
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) role: Option<&'static str>,
    pub(super) parts: Vec<PartDto>,
}

impl ContentDto {
    pub(super) fn user(parts: Vec<PartDto>) -> Self {
        Self {
            role: Some("user"),
            parts,
        }
    }

    pub(super) fn system(text: String) -> Self {
        Self {
            role: None,
            parts: vec![PartDto::text(text)],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PartDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) inline_data: Option<InlineDataDto>,
}

impl PartDto {
    pub(super) fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub(super) fn inline(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineDataDto {
                mime_type: mime_type.to_owned(),
                data: data.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InlineDataDto {
    pub(super) mime_type: String,
    pub(super) data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ToolDto {
    pub(super) google_maps: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ToolConfigDto {
    pub(super) retrieval_config: RetrievalConfigDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RetrievalConfigDto {
    pub(super) lat_lng: LatLngDto,
}

#[derive(Debug, Serialize)]
pub(super) struct LatLngDto {
    pub(super) latitude: f64,
    pub(super) longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfigDto {
    pub(super) response_mime_type: &'static str,
    pub(super) response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponse {
    #[serde(default)]
    pub(super) candidates: Vec<CandidateDto>,
    #[serde(default)]
    pub(super) prompt_feedback: Option<PromptFeedbackDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CandidateDto {
    #[serde(default)]
    pub(super) content: Option<ResponseContentDto>,
    #[serde(default)]
    pub(super) grounding_metadata: Option<GroundingMetadataDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseContentDto {
    #[serde(default)]
    pub(super) parts: Vec<ResponsePartDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponsePartDto {
    #[serde(default)]
    pub(super) text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GroundingMetadataDto {
    #[serde(default)]
    pub(super) grounding_chunks: Vec<GroundingChunkDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GroundingChunkDto {
    #[serde(default)]
    pub(super) maps: Option<MapsChunkDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MapsChunkDto {
    #[serde(default)]
    pub(super) uri: Option<String>,
    #[serde(default)]
    pub(super) title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PromptFeedbackDto {
    #[serde(default)]
    pub(super) block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub(super) fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|part| part.text.as_deref()).collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    /// Maps grounding chunks of the first candidate, deduplicated by URI.
    pub(super) fn location_links(&self) -> Vec<LocationLink> {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
        else {
            return Vec::new();
        };
        let mut links: Vec<LocationLink> = Vec::new();
        for maps in metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.maps.as_ref())
        {
            let Some(uri) = maps.uri.as_deref().filter(|uri| !uri.is_empty()) else {
                continue;
            };
            if links.iter().any(|link| link.uri == uri) {
                continue;
            }
            let title = maps
                .title
                .as_deref()
                .filter(|title| !title.trim().is_empty())
                .unwrap_or(uri);
            links.push(LocationLink {
                uri: uri.to_owned(),
                title: title.trim().to_owned(),
            });
        }
        links
    }

    pub(super) fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
    }
}
