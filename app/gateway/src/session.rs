//! One streaming request from start to terminal.

use crate::bus::StreamBus;
use compact_str::CompactString;
use futures_util::StreamExt;
use quill_model::{
    Frame, FrameParser, Prompt, ProviderRecord, StreamError, StreamEvent, build_request,
};
use reqwest::Client;
use tokio::sync::oneshot;

/// Upper bound on the error-body excerpt captured from a failed request.
const EXCERPT_LIMIT: usize = 2048;

/// Drives one upstream request, publishing normalized events until the
/// upstream completes, fails, or the session is cancelled.
pub struct StreamSession {
    stream_id: CompactString,
    record: ProviderRecord,
    prompt: Prompt,
    bus: StreamBus,
}

impl StreamSession {
    /// Create a session bound to a stream id and output bus.
    pub fn new(
        stream_id: impl Into<CompactString>,
        record: ProviderRecord,
        prompt: Prompt,
        bus: StreamBus,
    ) -> Self {
        Self {
            stream_id: stream_id.into(),
            record,
            prompt,
            bus,
        }
    }

    /// Run to termination. Cancellation is observed at every await point
    /// and is silent: a cancelled session publishes nothing further.
    pub async fn run(self, client: Client, mut cancel: oneshot::Receiver<()>) {
        let id = self.stream_id.clone();
        let request = build_request(&client, &self.record, &self.prompt);
        tracing::debug!(
            stream_id = %id,
            provider = self.record.kind.as_str(),
            "stream starting"
        );

        let response = tokio::select! {
            _ = &mut cancel => {
                tracing::debug!(stream_id = %id, "cancelled before connect");
                return;
            }
            sent = request.send() => match sent {
                Ok(response) => response,
                Err(e) => {
                    self.bus
                        .publish(StreamEvent::failed(id, StreamError::from(e).to_string()));
                    return;
                }
            },
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            let Some(excerpt) = read_excerpt(response, &mut cancel).await else {
                tracing::debug!(stream_id = %id, "cancelled while reading rejection body");
                return;
            };
            let error = StreamError::Status {
                status: status.as_u16(),
                excerpt,
            };
            tracing::debug!(stream_id = %id, status = status.as_u16(), "upstream rejected stream");
            self.bus.publish(StreamEvent::failed(id, error.to_string()));
            return;
        }

        let mut parser = FrameParser::for_kind(self.record.kind);
        let mut body = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = &mut cancel => {
                    tracing::debug!(stream_id = %id, "cancelled mid-stream");
                    return;
                }
                chunk = body.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => match parser.feed(&bytes) {
                    Ok(frames) => {
                        for frame in frames {
                            match frame {
                                Frame::Delta(text) => {
                                    self.bus.publish(StreamEvent::delta(id.clone(), text));
                                }
                                Frame::Stop => {
                                    tracing::debug!(stream_id = %id, "stream complete");
                                    self.bus.publish(StreamEvent::done(id));
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        self.bus.publish(StreamEvent::failed(id, e.to_string()));
                        return;
                    }
                },
                Some(Err(e)) => {
                    self.bus
                        .publish(StreamEvent::failed(id, StreamError::from(e).to_string()));
                    return;
                }
                None => break,
            }
        }

        match parser.finish() {
            Ok(Some(_)) => {
                tracing::debug!(stream_id = %id, "stream complete at body close");
                self.bus.publish(StreamEvent::done(id));
            }
            // Terminal already published inside the loop.
            Ok(None) => {}
            Err(e) => self.bus.publish(StreamEvent::failed(id, e.to_string())),
        }
    }
}

/// Read at most [`EXCERPT_LIMIT`] bytes of an error body, racing the
/// session's cancellation signal on every read. Returns `None` when
/// cancelled — the caller publishes nothing in that case.
async fn read_excerpt(
    response: reqwest::Response,
    cancel: &mut oneshot::Receiver<()>,
) -> Option<String> {
    let mut buf: Vec<u8> = Vec::new();
    let mut body = response.bytes_stream();
    loop {
        let chunk = tokio::select! {
            _ = &mut *cancel => return None,
            chunk = body.next() => chunk,
        };
        match chunk {
            Some(Ok(bytes)) => {
                buf.extend_from_slice(&bytes);
                if buf.len() >= EXCERPT_LIMIT {
                    buf.truncate(EXCERPT_LIMIT);
                    break;
                }
            }
            // Read failures and body end both cap the excerpt here.
            Some(Err(_)) | None => break,
        }
    }
    Some(String::from_utf8_lossy(&buf).into_owned())
}
