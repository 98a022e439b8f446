//! Process-wide façade translating UI calls into session lifecycle and
//! catalogue operations.
//!
//! Owns the map from stream id to live session cancel handle; entries are
//! inserted on start and removed when the driver task reaches terminal on
//! any path. Concurrent streams are isolated by stream id.

use crate::{
    bus::StreamBus,
    config::{ConfigError, ConfigStore},
    session::StreamSession,
};
use compact_str::CompactString;
use quill_model::{AppConfig, Prompt, ProviderRecord, StreamEvent};
use reqwest::Client;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

/// Connect-phase timeout. Streaming itself has no wall-clock bound; long
/// generations are expected.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Probe prompt used by connection tests.
const PROBE_PROMPT: &str = "Say 'OK' in one word.";

/// Errors surfaced directly to UI operations.
#[derive(Debug)]
pub enum DispatchError {
    /// A provider record failed validation before any network I/O.
    InvalidRecord(String),
    /// A catalogue operation failed.
    Config(ConfigError),
    /// A connection probe came back with an error.
    Probe(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRecord(reason) => write!(f, "invalid provider config: {reason}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Probe(reason) => write!(f, "connection test failed: {reason}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for DispatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// The process-wide gateway façade.
pub struct Dispatcher {
    client: Client,
    store: ConfigStore,
    bus: StreamBus,
    sessions: Arc<Mutex<BTreeMap<CompactString, oneshot::Sender<()>>>>,
}

impl Dispatcher {
    /// Create a dispatcher over a configuration store.
    pub fn new(store: ConfigStore) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("http client construction");
        Self {
            client,
            store,
            bus: StreamBus::new(),
            sessions: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Subscribe to the `llm-stream` channel. Receivers filter by
    /// `stream_id`.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.bus.subscribe()
    }

    /// Validate a record, spawn its streaming session, and return the
    /// fresh stream id without waiting for the first byte.
    pub fn start_stream(
        &self,
        record: ProviderRecord,
        prompt: Prompt,
    ) -> Result<CompactString, DispatchError> {
        record
            .validate()
            .map_err(|e| DispatchError::InvalidRecord(e.to_string()))?;

        let stream_id = mint_stream_id();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .insert(stream_id.clone(), cancel_tx);

        let session = StreamSession::new(stream_id.clone(), record, prompt, self.bus.clone());
        let client = self.client.clone();
        let sessions = Arc::clone(&self.sessions);
        let id = stream_id.clone();
        tokio::spawn(async move {
            session.run(client, cancel_rx).await;
            sessions
                .lock()
                .expect("session table lock poisoned")
                .remove(&id);
        });

        Ok(stream_id)
    }

    /// Signal cancellation. Idempotent; unknown ids are a no-op. The
    /// session publishes nothing further once it observes the signal.
    pub fn cancel_stream(&self, stream_id: &str) {
        let handle = self
            .sessions
            .lock()
            .expect("session table lock poisoned")
            .remove(stream_id);
        if let Some(cancel) = handle {
            let _ = cancel.send(());
            tracing::debug!(stream_id, "stream cancel requested");
        }
    }

    /// Number of sessions that have not yet reached terminal.
    pub fn active_streams(&self) -> usize {
        self.sessions
            .lock()
            .expect("session table lock poisoned")
            .len()
    }

    /// Probe a record end-to-end with a trivial prompt on a private bus —
    /// nothing reaches `llm-stream`. The first delta counts as success
    /// (the probe is then cancelled); a clean terminal without deltas
    /// also succeeds; an error terminal is returned to the caller.
    pub async fn test_connection(&self, record: ProviderRecord) -> Result<(), DispatchError> {
        record
            .validate()
            .map_err(|e| DispatchError::InvalidRecord(e.to_string()))?;

        let bus = StreamBus::new();
        let mut events = bus.subscribe();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let mut cancel_tx = Some(cancel_tx);
        let session = StreamSession::new(mint_stream_id(), record, Prompt::user(PROBE_PROMPT), bus);
        tokio::spawn(session.run(self.client.clone(), cancel_rx));

        loop {
            match events.recv().await {
                Ok(event) if event.done => {
                    return match event.error {
                        None => Ok(()),
                        Some(error) => Err(DispatchError::Probe(error)),
                    };
                }
                Ok(event) if !event.delta.is_empty() => {
                    if let Some(cancel) = cancel_tx.take() {
                        let _ = cancel.send(());
                    }
                    return Ok(());
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(DispatchError::Probe(
                        "stream closed without completing".into(),
                    ));
                }
            }
        }
    }

    /// Load the catalogue, seeding the first-run default when absent.
    pub async fn load_config(&self) -> Result<AppConfig, DispatchError> {
        Ok(self.store.load_or_init().await?)
    }

    /// Validate and persist a catalogue.
    pub async fn save_config(&self, config: &AppConfig) -> Result<(), DispatchError> {
        Ok(self.store.save(config).await?)
    }

    /// Point the catalogue's default at an existing provider.
    pub async fn set_default_provider(&self, name: &str) -> Result<(), DispatchError> {
        Ok(self.store.set_default(name).await?)
    }

    /// Absolute path of the catalogue document, for display.
    pub fn config_path(&self) -> String {
        self.store.path().display().to_string()
    }
}

/// Mint a globally unique stream identifier.
fn mint_stream_id() -> CompactString {
    CompactString::from(uuid::Uuid::new_v4().to_string())
}
