//! Request construction for the generative-language streaming endpoint.

use crate::{Prompt, ProviderRecord};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

/// JSON body for a `streamGenerateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Instruction>,
    pub generation_config: GenerationConfig,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

/// The system instruction, carried outside `contents`.
#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
    pub parts: Vec<Part>,
}

/// A text fragment.
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

/// Sampling parameters.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
}

impl Request {
    /// Build the body from a prompt pair.
    pub fn new(prompt: &Prompt) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt.user.clone(),
                }],
            }],
            system_instruction: prompt.system.as_ref().map(|system| Instruction {
                parts: vec![Part {
                    text: system.clone(),
                }],
            }),
            generation_config: GenerationConfig { temperature: 0.3 },
        }
    }
}

/// Assemble the outbound HTTP request. The key travels in the query
/// string, not a header; `alt=sse` asks for SSE framing. The final URL
/// carries the credential, so only the body is ever traced.
pub fn build(client: &Client, record: &ProviderRecord, prompt: &Prompt) -> RequestBuilder {
    let url = format!(
        "{}/v1beta/models/{}:streamGenerateContent",
        record.base_url.trim_end_matches('/'),
        record.model,
    );
    let body = Request::new(prompt);
    if let Ok(json) = serde_json::to_string(&body) {
        tracing::trace!("request: {json}");
    }
    client
        .post(url)
        .query(&[("alt", "sse"), ("key", record.api_key.as_str())])
        .json(&body)
}
