//! OpenAI-compatible chat-completions adapter.
//!
//! Also covers DeepSeek, Moonshot, Ollama, and any other endpoint speaking
//! the same protocol — those differ only in `base_url` and `model`.

mod request;
mod stream;

pub use request::{ChatMessage, Request, build};
pub use stream::Parser;
