//! Request construction for the chat-completions endpoint.

use crate::{Prompt, ProviderRecord};
use reqwest::{Client, RequestBuilder, header};
use serde::Serialize;

/// JSON body for a streaming chat-completions call.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub model: String,
    pub stream: bool,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
}

/// One chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl Request {
    /// Build the body from a record and prompt pair. The system prompt,
    /// when present, becomes the leading `system` message.
    pub fn new(record: &ProviderRecord, prompt: &Prompt) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.user.clone(),
        });
        Self {
            model: record.model.to_string(),
            stream: true,
            temperature: 0.3,
            messages,
        }
    }
}

/// Assemble the outbound HTTP request. The bearer header is omitted when
/// the key is empty, which keyless local endpoints require.
pub fn build(client: &Client, record: &ProviderRecord, prompt: &Prompt) -> RequestBuilder {
    let url = format!("{}/chat/completions", record.base_url.trim_end_matches('/'));
    let body = Request::new(record, prompt);
    if let Ok(json) = serde_json::to_string(&body) {
        tracing::trace!("request: {json}");
    }
    let mut builder = client.post(url).json(&body);
    if !record.api_key.is_empty() {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", record.api_key));
    }
    builder
}
