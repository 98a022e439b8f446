//! Gemini (Google generative-language) adapter.

mod request;
mod stream;

pub use request::{Content, GenerationConfig, Instruction, Part, Request, build};
pub use stream::Parser;
