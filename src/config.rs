use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    providers::openai::{OpenAICompatibleConfig, DEFAULT_BASE_URL},
    retry::RetryPolicy,
};

pub const DEFAULT_MODEL: &str = "llama3";

const ENV_BASE_URL: &str = "SCHREIBWERK_BASE_URL";
const ENV_API_KEY: &str = "SCHREIBWERK_API_KEY";
const ENV_MODEL: &str = "SCHREIBWERK_MODEL";
const ENV_TIMEOUT_MS: &str = "SCHREIBWERK_TIMEOUT_MS";

/// Backend and output settings for a run.
///
/// Layered lowest to highest: built-in defaults, an optional YAML file,
/// `SCHREIBWERK_*` environment variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            timeout_ms: 300_000,
            retry: RetryPolicy::none(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Defaults or the given file, overlaid with the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.with_env_from(|key| env::var(key).ok())
    }

    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model = model;
        }
        if let Some(timeout_ms) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = timeout_ms
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_MS,
                    value: timeout_ms,
                })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn provider_config(&self) -> OpenAICompatibleConfig {
        let config = OpenAICompatibleConfig::new(self.base_url.clone()).with_timeout(self.timeout());
        match self.api_key {
            Some(ref key) => config.with_api_key(key.clone()),
            None => config,
        }
    }
}
