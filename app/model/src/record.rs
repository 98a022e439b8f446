//! Provider catalogue records.

use anyhow::{Result, anyhow, bail};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Wire-protocol family of a provider endpoint.
///
/// DeepSeek, Moonshot, Ollama, and other OpenAI-compatible services are
/// `OpenAi` with a different `base_url` and `model` — not new variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// OpenAI chat-completions API and compatible endpoints.
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic Messages API.
    #[serde(rename = "claude")]
    Claude,
    /// Google generative-language API.
    #[serde(rename = "gemini")]
    Gemini,
}

impl ProviderKind {
    /// Human-readable name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }
}

/// One entry in the provider catalogue.
///
/// The external field name for `kind` is `type` (the on-disk spelling);
/// `provider_type` is also accepted on read, so the UI boundary and the
/// document cannot drift apart. Unknown keys survive a load/save
/// round-trip through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Wire-protocol family; selects the request and frame translation.
    #[serde(rename = "type", alias = "provider_type")]
    pub kind: ProviderKind,
    /// Endpoint root. No trailing slash required; paths are appended.
    pub base_url: String,
    /// Credential, stored verbatim. Empty is permitted for keyless local
    /// endpoints (Ollama).
    pub api_key: String,
    /// Exact model identifier passed to the provider.
    pub model: CompactString,
    /// Advisory context window size. Carried, not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    /// Anthropic API revision, sent as the `anthropic-version` header.
    /// Required when `kind` is `Claude`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Unknown keys, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ProviderRecord {
    /// Validate field combinations before any network I/O.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| anyhow!("base_url '{}' is not a valid URL: {e}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("base_url '{}' must be http or https", self.base_url);
        }
        if self.model.is_empty() {
            bail!("model is required");
        }
        if self.kind == ProviderKind::Claude
            && self.api_version.as_deref().is_none_or(str::is_empty)
        {
            bail!("claude provider requires a non-empty api_version");
        }
        Ok(())
    }
}
