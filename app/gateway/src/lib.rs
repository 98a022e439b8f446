//! Streaming LLM gateway core for the quill desktop app.
//!
//! Brokers text-generation requests between the UI and remote providers:
//! validates a provider record, spawns a cancellable streaming session,
//! and publishes normalized `llm-stream` events tagged with their stream
//! id. Also owns the durable provider catalogue.

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod session;

pub use bus::{STREAM_CHANNEL, StreamBus};
pub use config::{ConfigError, ConfigStore};
pub use dispatch::{DispatchError, Dispatcher};
pub use session::StreamSession;
