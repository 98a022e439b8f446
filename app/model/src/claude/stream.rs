//! Incremental parser for the Anthropic Messages SSE stream.
//!
//! Blocks carry an `event:` line naming the kind and a `data:` JSON line.
//! Only `content_block_delta`, `message_stop`, and `error` matter here;
//! everything else (ping, message_start, content_block_start/stop,
//! message_delta) is ignored.

use crate::sse::{BlockSplitter, Terminal};
use crate::{Frame, StreamError};
use serde::Deserialize;

/// Payload of a `content_block_delta` event.
#[derive(Debug, Deserialize)]
struct DeltaEvent {
    delta: BlockDelta,
}

#[derive(Debug, Deserialize)]
struct BlockDelta {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

/// Payload of an `error` event.
#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Fallback routing when a block has no `event:` line — real deployments
/// also tag the data payload with a `type` field.
#[derive(Debug, Deserialize)]
struct Tagged {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Resumable frame parser for the Messages event stream. An error in a
/// later block never drops frames parsed earlier in the same call.
#[derive(Debug, Default)]
pub struct Parser {
    splitter: BlockSplitter,
    terminal: Terminal,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume appended body bytes, returning completed frames.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, StreamError> {
        if self.terminal.done() {
            return Ok(Vec::new());
        }
        if let Some(error) = self.terminal.take_pending() {
            return Err(error);
        }
        self.splitter.push(bytes);
        let mut frames = Vec::new();
        while let Some(block) = self.splitter.next_block() {
            let block = match block {
                Ok(block) => block,
                Err(e) => return self.terminal.fail(frames, e),
            };
            let (name, data) = split_block(&block);
            let name = match (name, data) {
                (Some(name), _) => name.to_owned(),
                (None, Some(data)) => match serde_json::from_str::<Tagged>(data) {
                    Ok(Tagged { kind: Some(kind) }) => kind,
                    _ => continue,
                },
                (None, None) => continue,
            };
            match name.as_str() {
                "content_block_delta" => {
                    let Some(data) = data else {
                        let error =
                            StreamError::Protocol("content_block_delta without data".into());
                        return self.terminal.fail(frames, error);
                    };
                    let event: DeltaEvent = match serde_json::from_str(data) {
                        Ok(event) => event,
                        Err(e) => {
                            let error = StreamError::Protocol(format!("bad content delta: {e}"));
                            return self.terminal.fail(frames, error);
                        }
                    };
                    if event.delta.kind.as_deref() == Some("text_delta")
                        && let Some(text) = event.delta.text
                        && !text.is_empty()
                    {
                        frames.push(Frame::Delta(text));
                    }
                }
                "message_stop" => {
                    self.terminal.stop();
                    frames.push(Frame::Stop);
                    return Ok(frames);
                }
                "error" => {
                    let message = data
                        .and_then(|data| serde_json::from_str::<ErrorEvent>(data).ok())
                        .map(|event| event.error.message)
                        .unwrap_or_else(|| "unspecified provider error".to_owned());
                    return self.terminal.fail(frames, StreamError::Upstream(message));
                }
                _ => {}
            }
        }
        Ok(frames)
    }

    /// Body closed. A held error surfaces here; otherwise a clean close
    /// counts as completion and partial trailing data does not.
    pub fn finish(self) -> Result<Option<Frame>, StreamError> {
        let has_residue = self.splitter.has_residue();
        self.terminal.close(has_residue)
    }
}

/// Extract the `event:` name and `data:` payload from one SSE block.
fn split_block(block: &str) -> (Option<&str>, Option<&str>) {
    let mut name = None;
    let mut data = None;
    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            name = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim());
        }
    }
    (name, data)
}
