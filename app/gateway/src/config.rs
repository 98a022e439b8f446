//! Durable provider catalogue storage.
//!
//! One TOML document holds the whole catalogue. Reads and writes are
//! serialized through a single async mutex and rewrite the file whole —
//! the document is small. Saves are atomic: write to a sibling temp file,
//! then rename over the document.

use compact_str::CompactString;
use quill_model::AppConfig;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "quill";
/// Catalogue document filename.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors from catalogue load/save operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No document exists on disk.
    Missing,
    /// The document or a candidate catalogue violates an invariant.
    Invalid(String),
    /// Filesystem read/write failed.
    Io(io::Error),
    /// `set_default` named a provider not in the catalogue.
    UnknownProvider(CompactString),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no configuration document exists"),
            Self::Invalid(detail) => write!(f, "invalid configuration: {detail}"),
            Self::Io(e) => write!(f, "configuration io error: {e}"),
            Self::UnknownProvider(name) => write!(f, "provider '{name}' not found"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Owns the on-disk catalogue document.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl ConfigStore {
    /// Store backed by an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Store at the platform default location
    /// (`<config dir>/quill/config.toml`).
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .expect("no platform config directory")
            .join(CONFIG_DIR);
        Self::new(dir.join(CONFIG_FILE))
    }

    /// Absolute path of the document, for display.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalogue. Fails with [`ConfigError::Missing`] when no
    /// document exists.
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        let _guard = self.guard.lock().await;
        self.read_document().await
    }

    /// Load the catalogue, seeding and persisting the first-run default
    /// when no document exists.
    pub async fn load_or_init(&self) -> Result<AppConfig, ConfigError> {
        let _guard = self.guard.lock().await;
        match self.read_document().await {
            Err(ConfigError::Missing) => {
                let seed = AppConfig::seed();
                self.write_document(&seed).await?;
                tracing::info!(path = %self.path.display(), "seeded default catalogue");
                Ok(seed)
            }
            other => other,
        }
    }

    /// Validate and persist a catalogue atomically.
    pub async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let _guard = self.guard.lock().await;
        self.write_document(config).await
    }

    /// Point `default` at an existing provider and persist.
    pub async fn set_default(&self, name: &str) -> Result<(), ConfigError> {
        let _guard = self.guard.lock().await;
        let mut config = self.read_document().await?;
        if !config.providers.contains_key(name) {
            return Err(ConfigError::UnknownProvider(name.into()));
        }
        config.default = name.into();
        self.write_document(&config).await
    }

    async fn read_document(&self) -> Result<AppConfig, ConfigError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::Missing),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }

    async fn write_document(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
