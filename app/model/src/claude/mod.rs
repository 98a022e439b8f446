//! Claude (Anthropic) Messages adapter.

mod request;
mod stream;

pub use request::{Request, UserMessage, build};
pub use stream::Parser;
