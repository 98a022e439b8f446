//! Session-local stream failures.

use std::fmt;

/// Errors that end a stream with an error terminal event.
///
/// The `Display` string is what the UI shows next to the stream's output
/// area, so every variant renders a complete human-readable sentence.
#[derive(Debug)]
pub enum StreamError {
    /// Upstream returned HTTP >= 400. Carries a bounded body excerpt.
    Status { status: u16, excerpt: String },
    /// The provider reported an error mid-stream.
    Upstream(String),
    /// A fully delimited frame failed to parse.
    Protocol(String),
    /// The body closed with partial data and no terminal marker.
    UnexpectedEnd,
    /// DNS/TCP/TLS/read failure.
    Network(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, excerpt } => write!(f, "HTTP {status}: {excerpt}"),
            Self::Upstream(message) => write!(f, "provider error: {message}"),
            Self::Protocol(detail) => write!(f, "protocol error: {detail}"),
            Self::UnexpectedEnd => write!(f, "stream ended before completion"),
            Self::Network(detail) => write!(f, "network error: {detail}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
