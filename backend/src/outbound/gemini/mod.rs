//! Gemini outbound adapter.
//!
//! Implements the `AiGateway` port against the Generative Language REST API
//! (`models/{model}:generateContent`).

mod dto;
mod http_gateway;
mod prompts;

pub use http_gateway::{GeminiAiGateway, GeminiConfig};
