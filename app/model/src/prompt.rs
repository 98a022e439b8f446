//! Prompt pair passed into a streaming request.

use serde::{Deserialize, Serialize};

/// The user prompt plus an optional system prompt. Both are free-form
/// UTF-8; no length enforcement at this layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prompt {
    /// The user turn.
    pub user: String,
    /// Optional system instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Prompt {
    /// Create a prompt with only a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            user: content.into(),
            system: None,
        }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}
