//! Incremental parser for the chat-completions SSE stream.

use crate::sse::{self, BlockSplitter, Terminal};
use crate::{Frame, StreamError};
use serde::Deserialize;

/// One `data:` payload.
#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Resumable frame parser. Feeding the body chunk-by-chunk at arbitrary
/// byte splits yields the same frames as feeding it whole; an error in a
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
            for line in block.lines() {
                let Some(data) = sse::data_line(line) else {
                    continue;
                };
                if data == "[DONE]" {
                    self.terminal.stop();
                    frames.push(Frame::Stop);
                    return Ok(frames);
                }
                let chunk: Chunk = match serde_json::from_str(data) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let error = StreamError::Protocol(format!("bad completion chunk: {e}"));
                        return self.terminal.fail(frames, error);
                    }
                };
                let Some(choice) = chunk.choices.first() else {
                    continue;
                };
                if let Some(content) = &choice.delta.content
                    && !content.is_empty()
                {
                    frames.push(Frame::Delta(content.clone()));
                }
                if choice.finish_reason.is_some() {
                    self.terminal.stop();
                    frames.push(Frame::Stop);
                    return Ok(frames);
                }
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
