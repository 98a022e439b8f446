//! Request construction for the Anthropic Messages endpoint.

use crate::{Prompt, ProviderRecord};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

/// Output cap sent with every request; the API requires one.
const MAX_TOKENS: u32 = 4096;

/// JSON body for a streaming Messages call.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub model: String,
    pub stream: bool,
    pub max_tokens: u32,
    /// System prompt is a top-level field, never a messages entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<UserMessage>,
}

/// The single user turn carried by a gateway request.
#[derive(Debug, Clone, Serialize)]
pub struct UserMessage {
    pub role: &'static str,
    pub content: String,
}

impl Request {
    /// Build the body from a record and prompt pair.
    pub fn new(record: &ProviderRecord, prompt: &Prompt) -> Self {
        Self {
            model: record.model.to_string(),
            stream: true,
            max_tokens: MAX_TOKENS,
            system: prompt.system.clone(),
            messages: vec![UserMessage {
                role: "user",
                content: prompt.user.clone(),
            }],
        }
    }
}

/// Assemble the outbound HTTP request. `api_version` is validated
/// non-empty before any session reaches this point.
pub fn build(client: &Client, record: &ProviderRecord, prompt: &Prompt) -> RequestBuilder {
    let url = format!("{}/v1/messages", record.base_url.trim_end_matches('/'));
    let body = Request::new(record, prompt);
    if let Ok(json) = serde_json::to_string(&body) {
        tracing::trace!("request: {json}");
    }
    client
        .post(url)
        .header("x-api-key", record.api_key.as_str())
        .header(
            "anthropic-version",
            record.api_version.as_deref().unwrap_or_default(),
        )
        .json(&body)
}
