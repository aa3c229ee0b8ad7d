//! Engine configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model provider configuration
    pub provider: ProviderConfig,

    /// Retry and attempt limits
    pub limits: LimitsConfig,
}

impl EngineConfig {
    /// Validate configuration before use
    ///
    /// Call this early to fail fast with a clear message instead of failing
    /// on the first model call.
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider == "anthropic" && std::env::var(&self.provider.api_key_env).is_err()
        {
            return Err(eyre::eyre!(
                "no api key: set the {} environment variable",
                self.provider.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.colloquy.yml`, then the user config directory,
    /// then built-in defaults. An unreadable file on the fallback chain is
    /// logged and skipped; an unreadable explicit path is an error.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .with_context(|| format!("could not load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".colloquy.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("config at {} did not load: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("colloquy").join("colloquy.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("config at {} did not load: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("no config file found, using built-in defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("could not read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("could not parse config file")?;

        tracing::info!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider id; `anthropic` is the only one wired up
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl ProviderConfig {
    /// Read the API key from the configured environment variable
    pub fn resolve_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .with_context(|| format!("environment variable {} is not set", self.api_key_env))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 300_000,
        }
    }
}

/// Retry and attempt limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Default validation budget for leaves without an override
    #[serde(rename = "validation-attempts")]
    pub validation_attempts: u32,

    /// Suggested loop ceiling for callers that do not pick their own
    #[serde(rename = "loop-attempts")]
    pub loop_attempts: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { validation_attempts: 3, loop_attempts: 8 }
    }
}
