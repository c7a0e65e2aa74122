//! Generation parameters and the file/environment configuration layer.
//!
//! [`Config`] is loaded with `figment`: built-in defaults, then an optional
//! TOML file, then `BLOGFLOW_`-prefixed environment variables (nested keys
//! separated by `__`, e.g. `BLOGFLOW_DEMO__CHUNK_LEN=20`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::backend::gemini::GEMINI_BASE_URL;
use crate::demo::DemoConfig;
use crate::error::{BlogflowError, Result};
use crate::exec_ctx::{ExecCtx, ExecCtxBuilder};
use crate::invoker::ModelCandidates;
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};

/// Per-request generation parameters. `None` leaves the provider default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Sampling temperature.
    pub temperature: Option<f64>,

    /// Maximum tokens to generate.
    pub max_output_tokens: Option<u32>,
}

impl LlmConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider (or relay) base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model candidates in fallback order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// HTTP client timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Generation parameters.
    #[serde(default)]
    pub generation: LlmConfig,

    /// Demo-mode pacing.
    #[serde(default)]
    pub demo: DemoConfig,

    /// Where the JSON file store keeps the draft and credential.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    GEMINI_BASE_URL.to_string()
}

fn default_models() -> Vec<String> {
    ModelCandidates::default().to_vec()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            models: default_models(),
            timeout_secs: default_timeout_secs(),
            generation: LlmConfig::default(),
            demo: DemoConfig::default(),
            storage_path: None,
        }
    }
}

impl Config {
    /// Defaults, then `path` (if given), then `BLOGFLOW_*` environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("BLOGFLOW_").split("__"));
        Self::from_figment(figment)
    }

    /// Extract from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| BlogflowError::InvalidConfig(e.to_string()))
    }

    /// Parse a TOML document over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)),
        )
    }

    /// The configured candidate list, validated.
    pub fn candidates(&self) -> Result<ModelCandidates> {
        ModelCandidates::new(self.models.clone())
    }

    /// The store named by `storage_path`, or an in-memory one.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.storage_path {
            Some(path) => Arc::new(JsonFileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        }
    }

    /// Seed an [`ExecCtxBuilder`] from this configuration.
    ///
    /// Fails if the model list is empty.
    pub fn into_ctx_builder(self) -> Result<ExecCtxBuilder> {
        let candidates = self.candidates()?;
        Ok(ExecCtx::builder(self.base_url)
            .candidates(candidates)
            .generation(self.generation)
            .demo(self.demo)
            .timeout(Duration::from_secs(self.timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, GEMINI_BASE_URL);
        assert_eq!(
            config.models,
            vec!["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.0-pro"]
        );
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.demo.chunk_len, 10);
    }

    #[test]
    fn test_toml_overrides_merge_over_defaults() {
        let config = Config::from_toml_str(
            r#"
            models = ["gemini-2.0-flash", "gemini-1.5-flash"]
            timeout_secs = 30

            [demo]
            chunk_delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.models, vec!["gemini-2.0-flash", "gemini-1.5-flash"]);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.demo.chunk_delay_ms, 0);
        assert_eq!(config.demo.chunk_len, 10);
        assert_eq!(config.base_url, GEMINI_BASE_URL);
    }

    #[test]
    fn test_empty_model_list_rejected() {
        let config = Config::from_toml_str("models = []").unwrap();
        assert!(matches!(
            config.into_ctx_builder(),
            Err(BlogflowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_type_is_invalid_config() {
        let err = Config::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, BlogflowError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_open_store_uses_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogflow.json");
        let config = Config {
            storage_path: Some(path.clone()),
            ..Config::default()
        };
        config.open_store().set("k", "v").await.unwrap();
        assert!(path.exists());

        let memory = Config::default().open_store();
        assert_eq!(memory.get("k").await.unwrap(), None);
    }

    #[test]
    fn test_generation_settings() {
        let config = Config::from_toml_str(
            r#"
            [generation]
            temperature = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.temperature, Some(0.3));
        assert_eq!(config.generation.max_output_tokens, None);
    }
}
