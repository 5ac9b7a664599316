//! Minimal Google Gemini API client.
//!
//! This crate provides a focused client for Gemini's `generateContent`
//! endpoint with:
//! - Single-shot text completions
//! - Multi-turn content (user/model roles)
//! - Generation config (temperature, output token cap)
//!
//! Streaming and tool use are deliberately not supported; the consumers of
//! this crate make one-shot narrative requests.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Errors that can occur when using the Gemini client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Gemini API client.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .connect_timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Create a Gemini client from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (useful for pointing at a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a single-prompt request and return the generated text.
    ///
    /// This is the common path: one user turn in, first candidate's text out.
    pub async fn generate(&self, prompt: impl Into<String>) -> Result<String, Error> {
        let response = self.generate_request(Request::user(prompt)).await?;
        response
            .text()
            .ok_or_else(|| Error::Parse("response contained no text parts".to_string()))
    }

    /// Send a full request and return the parsed response.
    pub async fn generate_request(&self, request: Request) -> Result<Response, Error> {
        let api_request = build_api_request(&request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .headers(build_headers())
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_response(api_response))
    }
}

fn build_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

// ============================================================================
// Public types
// ============================================================================

/// A generation request.
#[derive(Debug, Clone)]
pub struct Request {
    pub contents: Vec<Content>,
    pub generation_config: Option<GenerationConfig>,
}

impl Request {
    /// Create a request from a single user prompt.
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            generation_config: None,
        }
    }

    /// Create a request from pre-built contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            generation_config: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// One turn of content in a request.
#[derive(Debug, Clone)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<String>,
}

impl Content {
    /// A user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    /// A model turn with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }
}

/// The role of a content turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// Generation tuning knobs.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// A generation response.
#[derive(Debug, Clone)]
pub struct Response {
    pub candidates: Vec<Candidate>,
}

impl Response {
    /// Text of the first candidate's first part, if any.
    ///
    /// This mirrors the API's documented success path:
    /// `candidates[0].content.parts[0].text`.
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.parts.first())
            .cloned()
    }
}

/// One response candidate.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub parts: Vec<String>,
    pub finish_reason: Option<FinishReason>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Other,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    content: Option<ApiContent>,
    finish_reason: Option<String>,
}

fn build_api_request(request: &Request) -> ApiRequest {
    let contents = request
        .contents
        .iter()
        .map(|c| ApiContent {
            role: Some(
                match c.role {
                    Role::User => "user",
                    Role::Model => "model",
                }
                .to_string(),
            ),
            parts: c
                .parts
                .iter()
                .map(|text| ApiPart { text: text.clone() })
                .collect(),
        })
        .collect();

    ApiRequest {
        contents,
        generation_config: request.generation_config.as_ref().map(|g| {
            ApiGenerationConfig {
                temperature: g.temperature,
                max_output_tokens: g.max_output_tokens,
            }
        }),
    }
}

fn parse_response(api_response: ApiResponse) -> Response {
    let candidates = api_response
        .candidates
        .into_iter()
        .map(|c| Candidate {
            parts: c
                .content
                .map(|content| content.parts.into_iter().map(|p| p.text).collect())
                .unwrap_or_default(),
            finish_reason: c.finish_reason.as_deref().map(|r| match r {
                "STOP" => FinishReason::Stop,
                "MAX_TOKENS" => FinishReason::MaxTokens,
                "SAFETY" => FinishReason::Safety,
                _ => FinishReason::Other,
            }),
        })
        .collect();

    Response { candidates }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = Request::user("Hello there");
        let body = serde_json::to_value(build_api_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello there");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_with_generation_config() {
        let request = Request::user("Hi")
            .with_temperature(0.8)
            .with_max_output_tokens(256);
        let body = serde_json::to_value(build_api_request(&request)).unwrap();

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_multi_turn_contents() {
        let request = Request::new(vec![
            Content::user("Will you answer the call?"),
            Content::model("John Pork is calling."),
            Content::user("Decline"),
        ]);
        let body = serde_json::to_value(build_api_request(&request)).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
    }

    #[test]
    fn test_parse_success_response() {
        let json = r#"{
            "candidates": [
                {
                    "content": { "role": "model", "parts": [ { "text": "Hello, player." } ] },
                    "finishReason": "STOP"
                }
            ]
        }"#;
        let api: ApiResponse = serde_json::from_str(json).unwrap();
        let response = parse_response(api);

        assert_eq!(response.text().as_deref(), Some("Hello, player."));
        assert_eq!(
            response.candidates[0].finish_reason,
            Some(FinishReason::Stop)
        );
    }

    #[test]
    fn test_parse_empty_candidates() {
        let api: ApiResponse = serde_json::from_str("{}").unwrap();
        let response = parse_response(api);

        assert!(response.text().is_none());
        assert!(response.candidates.is_empty());
    }

    #[test]
    fn test_parse_candidate_without_content() {
        let json = r#"{ "candidates": [ { "finishReason": "SAFETY" } ] }"#;
        let api: ApiResponse = serde_json::from_str(json).unwrap();
        let response = parse_response(api);

        assert!(response.text().is_none());
        assert_eq!(
            response.candidates[0].finish_reason,
            Some(FinishReason::Safety)
        );
    }
}
