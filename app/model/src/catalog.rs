//! The provider catalogue.

use crate::{ProviderKind, ProviderRecord};
use anyhow::{Result, anyhow, bail};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full catalogue: a default selection plus named provider records.
///
/// Unknown top-level keys survive a load/save round-trip through `extra`.
/// `extra` sits between `default` and `providers` because TOML emits
/// values before tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the provider used when the UI does not pick one.
    pub default: CompactString,
    /// Unknown keys, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: toml::Table,
    /// Named provider records.
    pub providers: BTreeMap<CompactString, ProviderRecord>,
}

impl AppConfig {
    /// Validate catalogue invariants.
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            bail!("at least one provider is required");
        }
        if self.default.is_empty() {
            bail!("default provider name is empty");
        }
        if !self.providers.contains_key(&self.default) {
            bail!("default provider '{}' is not in the catalogue", self.default);
        }
        for (name, record) in &self.providers {
            record
                .validate()
                .map_err(|e| anyhow!("provider '{name}': {e}"))?;
        }
        Ok(())
    }

    /// First-run catalogue: a single keyless OpenAI entry.
    pub fn seed() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            CompactString::from("openai"),
            ProviderRecord {
                kind: ProviderKind::OpenAi,
                base_url: "https://api.openai.com/v1".to_owned(),
                api_key: String::new(),
                model: "gpt-4o".into(),
                context_window: Some(128_000),
                api_version: None,
                extra: toml::Table::new(),
            },
        );
        Self {
            default: CompactString::from("openai"),
            extra: toml::Table::new(),
            providers,
        }
    }
}
