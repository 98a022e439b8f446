//! Incremental Server-Sent-Events block splitting and shared terminal
//! bookkeeping for the frame parsers.
//!
//! Raw bytes are buffered and only decoded once a block is fully
//! delimited, so multi-byte UTF-8 sequences may straddle chunk boundaries
//! safely. Invalid UTF-8 inside a delimited block is a protocol error.

use crate::{Frame, StreamError};

/// Splits an SSE byte stream into complete blocks (separated by a blank
/// line, tolerating `\r\n` line endings). Blocks are drained one at a
/// time so a bad block never swallows the ones parsed before it.
#[derive(Debug, Default)]
pub(crate) struct BlockSplitter {
    buf: Vec<u8>,
}

impl BlockSplitter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append body bytes to the buffer.
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drain the next fully delimited block, skipping whitespace-only
    /// blocks.
    pub(crate) fn next_block(&mut self) -> Option<Result<String, StreamError>> {
        while let Some((end, sep)) = find_blank_line(&self.buf) {
            let block = self.buf[..end].to_vec();
            self.buf.drain(..end + sep);
            match String::from_utf8(block) {
                Ok(text) => {
                    if !text.trim().is_empty() {
                        return Some(Ok(text));
                    }
                }
                Err(e) => {
                    return Some(Err(StreamError::Protocol(format!(
                        "invalid utf-8 in frame: {e}"
                    ))));
                }
            }
        }
        None
    }

    /// Whether undelimited non-whitespace bytes remain buffered.
    pub(crate) fn has_residue(&self) -> bool {
        !self.buf.iter().all(u8::is_ascii_whitespace)
    }
}

/// Strip the `data:` prefix from an SSE line, if present.
pub(crate) fn data_line(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

/// Tracks a parser's terminal state: a stop marker already emitted, or an
/// error held back so frames parsed earlier in the same `feed` call are
/// not dropped with it.
#[derive(Debug, Default)]
pub(crate) struct Terminal {
    done: bool,
    pending: Option<StreamError>,
}

impl Terminal {
    /// Whether a terminal frame has been emitted; nothing may follow it.
    pub(crate) fn done(&self) -> bool {
        self.done
    }

    /// Record an emitted stop marker.
    pub(crate) fn stop(&mut self) {
        self.done = true;
    }

    /// Take a held-back error, marking the parser finished.
    pub(crate) fn take_pending(&mut self) -> Option<StreamError> {
        let error = self.pending.take();
        if error.is_some() {
            self.done = true;
        }
        error
    }

    /// Surface an error without dropping frames parsed earlier in the
    /// same call: with none parsed it fails immediately, otherwise the
    /// frames are returned and the error is held for the next call.
    pub(crate) fn fail(
        &mut self,
        frames: Vec<Frame>,
        error: StreamError,
    ) -> Result<Vec<Frame>, StreamError> {
        if frames.is_empty() {
            self.done = true;
            Err(error)
        } else {
            self.pending = Some(error);
            Ok(frames)
        }
    }

    /// Resolve the stream's fate at body close: a held error surfaces, a
    /// terminal already seen means the residue is discarded, partial
    /// trailing data is an error, and a clean close counts as completion.
    pub(crate) fn close(self, has_residue: bool) -> Result<Option<Frame>, StreamError> {
        if let Some(error) = self.pending {
            return Err(error);
        }
        if self.done {
            Ok(None)
        } else if has_residue {
            Err(StreamError::UnexpectedEnd)
        } else {
            Ok(Some(Frame::Stop))
        }
    }
}

/// Find the first blank-line separator: the end of a block and the length
/// of the separator that follows it.
fn find_blank_line(buf: &[u8]) -> Option<(usize, usize)> {
    for i in 0..buf.len() {
        if buf[i] != b'\n' {
            continue;
        }
        if buf.get(i + 1) == Some(&b'\n') {
            return Some((i, 2));
        }
        if buf.get(i + 1) == Some(&b'\r') && buf.get(i + 2) == Some(&b'\n') {
            return Some((i, 3));
        }
    }
    None
}
