//! Dispatch from a provider record to its wire translation.

use crate::{Frame, Prompt, ProviderKind, ProviderRecord, StreamError, claude, gemini, openai};
use reqwest::{Client, RequestBuilder};

/// Build the outbound streaming request for a record's provider family.
pub fn build_request(client: &Client, record: &ProviderRecord, prompt: &Prompt) -> RequestBuilder {
    match record.kind {
        ProviderKind::OpenAi => openai::build(client, record, prompt),
        ProviderKind::Claude => claude::build(client, record, prompt),
        ProviderKind::Gemini => gemini::build(client, record, prompt),
    }
}

/// Resumable incremental parser over a provider family's frame format.
///
/// Accepts appended body bytes, emits zero or more completed frames, and
/// retains a residual buffer for incomplete frames. After a terminal
/// frame, it emits nothing further and discards trailing data.
#[derive(Debug)]
pub enum FrameParser {
    OpenAi(openai::Parser),
    Claude(claude::Parser),
    Gemini(gemini::Parser),
}

impl FrameParser {
    /// Select the parser for a provider family.
    pub fn for_kind(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OpenAi => Self::OpenAi(openai::Parser::new()),
            ProviderKind::Claude => Self::Claude(claude::Parser::new()),
            ProviderKind::Gemini => Self::Gemini(gemini::Parser::new()),
        }
    }

    /// Consume appended body bytes, returning completed frames.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, StreamError> {
        match self {
            Self::OpenAi(parser) => parser.feed(bytes),
            Self::Claude(parser) => parser.feed(bytes),
            Self::Gemini(parser) => parser.feed(bytes),
        }
    }

    /// The body closed; resolve the stream's fate.
    pub fn finish(self) -> Result<Option<Frame>, StreamError> {
        match self {
            Self::OpenAi(parser) => parser.finish(),
            Self::Claude(parser) => parser.finish(),
            Self::Gemini(parser) => parser.finish(),
        }
    }
}
