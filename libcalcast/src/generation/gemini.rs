//! Google Gemini content generator
//!
//! Calls the `generateContent` endpoint with a JSON response schema so the model
//! answers with an array of `{content, imagePrompt, dayOffset}` objects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{build_prompt, CandidatePost, ContentGenerator, GenerationRequest};
use crate::config::GenerationConfig;
use crate::error::{RemoteError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Schema the model's answer must follow
fn response_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "content": { "type": "STRING", "description": "The post caption/text" },
                "imagePrompt": { "type": "STRING", "description": "Description of the image to go with the post" },
                "dayOffset": { "type": "INTEGER", "description": "Number of days from start date (0-30)" }
            },
            "required": ["content", "imagePrompt", "dayOffset"]
        }
    })
}

/// HTTP client for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Concatenated text of the first candidate
fn response_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<Vec<CandidatePost>> {
        if credential.trim().is_empty() {
            return Err(RemoteError::MissingCredential(
                "Gemini API key is missing".to_string(),
            )
            .into());
        }

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            generation_config: GenerationSettings {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };

        debug!(model = %self.model, posts = request.post_count, "requesting generated posts");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(format!("failed to read response body: {e}")))?;
        debug!(status = %status, "generation response received");

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api_err) => format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status.unwrap_or_else(|| status.to_string()),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {text}"),
            };
            warn!(status = %status, "generation request rejected");
            return Err(RemoteError::Rejected(message).into());
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| RemoteError::MalformedResponse(format!("failed to parse API response: {e}")))?;

        let generated = response_text(parsed).ok_or_else(|| {
            RemoteError::MalformedResponse("response contained no generated text".to_string())
        })?;

        let candidates: Vec<CandidatePost> = serde_json::from_str(&generated).map_err(|e| {
            RemoteError::MalformedResponse(format!("generated posts do not match the schema: {e}"))
        })?;

        debug!(count = candidates.len(), "parsed generated posts");
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
