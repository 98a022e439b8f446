//! Normalized streaming output.

use compact_str::CompactString;
use serde::Serialize;

/// One unit of parsed upstream output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Incremental text.
    Delta(String),
    /// The upstream signalled end-of-stream.
    Stop,
}

/// The uniform event shape carried on the `llm-stream` channel,
/// independent of which provider family produced it.
///
/// Exactly one terminal event (`done == true`) ends each stream, unless
/// the stream was cancelled — cancellation is silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamEvent {
    /// Correlates the event with its originating request.
    pub stream_id: CompactString,
    /// Incremental text. Empty on terminal events.
    pub delta: String,
    /// True on the final event of a stream.
    pub done: bool,
    /// Human-readable failure, present only on error terminals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamEvent {
    /// An incremental text event.
    pub fn delta(stream_id: impl Into<CompactString>, delta: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            delta: delta.into(),
            done: false,
            error: None,
        }
    }

    /// A successful terminal event.
    pub fn done(stream_id: impl Into<CompactString>) -> Self {
        Self {
            stream_id: stream_id.into(),
            delta: String::new(),
            done: true,
            error: None,
        }
    }

    /// A failed terminal event.
    pub fn failed(stream_id: impl Into<CompactString>, error: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            delta: String::new(),
            done: true,
            error: Some(error.into()),
        }
    }
}
