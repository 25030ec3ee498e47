//! Ayrshare posting client
//!
//! Ayrshare fans one request out to every connected network. It reports
//! application errors in the body (`"status": "error"`), sometimes with a 200,
//! so the body is checked whatever the HTTP status.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{PublishPayload, PublishReceipt, SocialPoster};
use crate::config::PublishingConfig;
use crate::error::{RemoteError, Result};
use crate::types::Post;

const DEFAULT_POST_ERROR: &str = "Error posting to social networks";

/// HTTP client for the Ayrshare API
#[derive(Debug, Clone)]
pub struct AyrshareClient {
    client: reqwest::Client,
    base_url: String,
}

impl AyrshareClient {
    pub fn new(config: &PublishingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

fn require_credential(credential: &str) -> Result<()> {
    if credential.trim().is_empty() {
        return Err(RemoteError::MissingCredential("Ayrshare API key is missing".to_string()).into());
    }
    Ok(())
}

/// Error message carried by an Ayrshare error body, if the body is one
fn error_message(body: &Value) -> Option<String> {
    if body.get("status").and_then(Value::as_str) != Some("error") {
        return None;
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            body.get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_POST_ERROR.to_string());
    Some(message)
}

/// Platform codes from a `/user` answer
///
/// Newer accounts list `activeSocialAccounts`; older ones list `profiles`, as
/// plain codes or as objects with a `title`.
fn connected_codes(body: &Value) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();

    if let Some(active) = body.get("activeSocialAccounts").and_then(Value::as_array) {
        codes.extend(active.iter().filter_map(Value::as_str).map(str::to_lowercase));
    }

    if let Some(profiles) = body.get("profiles").and_then(Value::as_array) {
        for profile in profiles {
            let code = match profile {
                Value::String(code) => Some(code.as_str()),
                Value::Object(_) => profile.get("title").and_then(Value::as_str),
                _ => None,
            };
            if let Some(code) = code {
                codes.push(code.to_lowercase());
            }
        }
    }

    codes.sort();
    codes.dedup();
    codes
}

#[async_trait]
impl SocialPoster for AyrshareClient {
    async fn publish(&self, credential: &str, post: &Post) -> Result<PublishReceipt> {
        require_credential(credential)?;

        let payload = PublishPayload::from_post(post);
        debug!(
            post_id = %post.id,
            platforms = ?payload.platforms,
            media = payload.media_urls.len(),
            "sending post to Ayrshare"
        );

        let response = self
            .client
            .post(self.url("post"))
            .bearer_auth(credential)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(format!("failed to read response body: {e}")))?;
        debug!(status = %status, "Ayrshare post response received");

        let body: Value = serde_json::from_str(&text).map_err(|_| {
            if status.is_success() {
                RemoteError::MalformedResponse(format!("expected JSON from Ayrshare, got: {text}"))
            } else {
                RemoteError::Rejected(format!("API returned {status}: {text}"))
            }
        })?;

        if let Some(message) = error_message(&body) {
            warn!(post_id = %post.id, status = %status, "Ayrshare rejected post");
            return Err(RemoteError::Rejected(message).into());
        }

        if !status.is_success() {
            return Err(RemoteError::Rejected(format!("API returned {status}: {text}")).into());
        }

        Ok(PublishReceipt {
            status: body.get("status").and_then(Value::as_str).map(str::to_string),
            remote_id: body.get("id").and_then(Value::as_str).map(str::to_string),
        })
    }

    async fn connected_platforms(&self, credential: &str) -> Result<Vec<String>> {
        require_credential(credential)?;

        let response = self
            .client
            .get(self.url("user"))
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Ayrshare profile lookup failed");
            return Err(RemoteError::Rejected(format!(
                "Failed to verify API key ({status})"
            ))
            .into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(format!("failed to parse profile: {e}")))?;

        let codes = connected_codes(&body);
        debug!(connected = ?codes, "Ayrshare profile received");
        Ok(codes)
    }

    fn name(&self) -> &str {
        "ayrshare"
    }
}
