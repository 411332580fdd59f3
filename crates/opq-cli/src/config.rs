use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use opq_engine::EngineConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default provider to use (references [providers.X])
    pub default_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfigEntry>,

    #[serde(default)]
    pub engine: EngineConfigEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfigEntry {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub default_model: Option<String>,
}

/// Engine tuning from the `[engine]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigEntry {
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds terminal progress/results stay queryable.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Upper bound in seconds on a single provider call.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Cache entry count that triggers a sweep of expired entries.
    #[serde(default = "default_cache_high_water")]
    pub cache_high_water: usize,

    /// Per-kind overrides of the built-in duration/TTL profiles, keyed by
    /// kind name (e.g. [engine.kinds.clustering]).
    #[serde(default)]
    pub kinds: HashMap<String, KindProfileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KindProfileEntry {
    #[serde(default)]
    pub default_duration_secs: Option<u64>,

    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

fn default_workers() -> usize {
    1
}
fn default_retention_secs() -> u64 {
    60
}
fn default_provider_timeout_secs() -> u64 {
    60
}
fn default_cache_high_water() -> usize {
    256
}

impl Default for EngineConfigEntry {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            retention_secs: default_retention_secs(),
            provider_timeout_secs: default_provider_timeout_secs(),
            cache_high_water: default_cache_high_water(),
            kinds: HashMap::new(),
        }
    }
}

impl EngineConfigEntry {
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_workers(self.workers)
            .with_retention_window(Duration::from_secs(self.retention_secs))
            .with_provider_timeout(Duration::from_secs(self.provider_timeout_secs))
            .with_cache_high_water(self.cache_high_water)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            anyhow::bail!(
                "No configuration found. Create ~/.config/opq/config.toml with at least:\n\n\
                 default_provider = \"openai\"\n\n\
                 [providers.openai]\n\
                 api_key = \"sk-...\"\n\
                 default_model = \"gpt-4o-mini\"\n"
            )
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("opq").join("config.toml"))
    }
}
