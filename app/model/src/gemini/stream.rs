//! Incremental parser for the generative-language stream.
//!
//! Deployments answer `alt=sse` with SSE framing; some only offer a JSON
//! array of response objects instead. The mode is detected from the first
//! non-whitespace byte and fixed for the stream's lifetime.

use crate::sse::{self, BlockSplitter, Terminal};
use crate::{Frame, StreamError};
use serde::Deserialize;

/// One response object, in either framing mode.
#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug)]
enum Mode {
    Sse(BlockSplitter),
    Json(JsonSplitter),
}

/// Resumable frame parser for both Gemini framings. An error in a later
/// object never drops frames parsed earlier in the same call.
#[derive(Debug, Default)]
pub struct Parser {
    mode: Option<Mode>,
    /// Bytes buffered before the framing mode is known.
    first: Vec<u8>,
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
        if self.mode.is_none() {
            self.first.extend_from_slice(bytes);
            let Some(pos) = self.first.iter().position(|b| !b.is_ascii_whitespace()) else {
                return Ok(Vec::new());
            };
            self.mode = Some(if matches!(self.first[pos], b'[' | b'{') {
                Mode::Json(JsonSplitter::default())
            } else {
                Mode::Sse(BlockSplitter::new())
            });
            let buffered = std::mem::take(&mut self.first);
            return self.consume(&buffered);
        }
        self.consume(bytes)
    }

    /// Body closed. A held error surfaces here; close is otherwise a
    /// valid terminal for this family, unless partial frame data remains.
    pub fn finish(self) -> Result<Option<Frame>, StreamError> {
        let has_residue = match &self.mode {
            None => !self.first.iter().all(u8::is_ascii_whitespace),
            Some(Mode::Sse(splitter)) => splitter.has_residue(),
            Some(Mode::Json(splitter)) => splitter.has_residue(),
        };
        self.terminal.close(has_residue)
    }

    fn consume(&mut self, bytes: &[u8]) -> Result<Vec<Frame>, StreamError> {
        let mut frames = Vec::new();
        match self.mode.as_mut().expect("framing mode detected") {
            Mode::Sse(splitter) => {
                splitter.push(bytes);
                while let Some(block) = splitter.next_block() {
                    let block = match block {
                        Ok(block) => block,
                        Err(e) => return self.terminal.fail(frames, e),
                    };
                    for line in block.lines() {
                        let Some(data) = sse::data_line(line) else {
                            continue;
                        };
                        if let Err(e) = parse_chunk(data, &mut frames, &mut self.terminal) {
                            return self.terminal.fail(frames, e);
                        }
                        if self.terminal.done() {
                            return Ok(frames);
                        }
                    }
                }
            }
            Mode::Json(splitter) => {
                splitter.push(bytes);
                while let Some(object) = splitter.next_object() {
                    let object = match object {
                        Ok(object) => object,
                        Err(e) => return self.terminal.fail(frames, e),
                    };
                    if let Err(e) = parse_chunk(&object, &mut frames, &mut self.terminal) {
                        return self.terminal.fail(frames, e);
                    }
                    if self.terminal.done() {
                        return Ok(frames);
                    }
                }
            }
        }
        Ok(frames)
    }
}

/// Parse one response object into frames.
fn parse_chunk(
    data: &str,
    frames: &mut Vec<Frame>,
    terminal: &mut Terminal,
) -> Result<(), StreamError> {
    let chunk: Chunk = serde_json::from_str(data)
        .map_err(|e| StreamError::Protocol(format!("bad generate chunk: {e}")))?;
    let Some(candidate) = chunk.candidates.first() else {
        return Ok(());
    };
    if let Some(content) = &candidate.content {
        for part in &content.parts {
            if let Some(text) = &part.text
                && !text.is_empty()
            {
                frames.push(Frame::Delta(text.clone()));
            }
        }
    }
    if candidate.finish_reason.is_some() {
        terminal.stop();
        frames.push(Frame::Stop);
    }
    Ok(())
}

/// Splits a concatenated/array JSON object stream into complete objects,
/// drained one at a time. Objects are delimited by a string- and
/// escape-aware balanced-brace scan; `[`, `]`, `,`, and whitespace
/// between objects are skipped.
#[derive(Debug, Default)]
struct JsonSplitter {
    buf: Vec<u8>,
    /// Byte offset scanning resumes from.
    pos: usize,
    depth: u32,
    in_string: bool,
    escaped: bool,
    /// Offset of the current object's opening brace.
    start: Option<usize>,
}

impl JsonSplitter {
    /// Append body bytes to the buffer.
    fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Scan forward to the next complete object.
    fn next_object(&mut self) -> Option<Result<String, StreamError>> {
        while self.pos < self.buf.len() {
            let b = self.buf[self.pos];
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                }
            } else if self.depth == 0 {
                match b {
                    b'{' => {
                        self.start = Some(self.pos);
                        self.depth = 1;
                    }
                    b'[' | b']' | b',' => {}
                    _ if b.is_ascii_whitespace() => {}
                    _ => {
                        self.pos += 1;
                        return Some(Err(StreamError::Protocol(format!(
                            "unexpected byte '{}' between frames",
                            b as char
                        ))));
                    }
                }
            } else {
                match b {
                    b'"' => self.in_string = true,
                    b'{' => self.depth += 1,
                    b'}' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            let start = self.start.take().expect("object start recorded");
                            let end = self.pos;
                            self.pos += 1;
                            let object = match std::str::from_utf8(&self.buf[start..=end]) {
                                Ok(text) => text.to_owned(),
                                Err(e) => {
                                    return Some(Err(StreamError::Protocol(format!(
                                        "invalid utf-8 in frame: {e}"
                                    ))));
                                }
                            };
                            return Some(Ok(object));
                        }
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        // Drop consumed bytes once no object is in flight.
        if self.depth == 0 && self.start.is_none() {
            self.buf.clear();
            self.pos = 0;
        }
        None
    }

    /// Whether an object is still open or partially buffered.
    fn has_residue(&self) -> bool {
        self.depth > 0 || self.start.is_some()
    }
}
