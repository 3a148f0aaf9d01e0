//! Configuration loading, validation, and management for Quorum.
//!
//! Loads configuration from `~/.quorum/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use quorum_core::SessionFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.quorum/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model (or Azure deployment name)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Execution loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Context retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Code sandbox settings
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "azure".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("retrieval", &self.retrieval)
            .field("sandbox", &self.sandbox)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("document_limit", &self.document_limit)
            .field("graph_limit", &self.graph_limit)
            .field("search_endpoint", &self.search_endpoint)
            .field("search_index", &self.search_index)
            .field("search_api_key", &redact(&self.search_api_key))
            .field("seed_file", &self.seed_file)
            .field("session_files", &self.session_files)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL, or the Azure resource endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Azure OpenAI `api-version` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Azure OpenAI deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Settings for the tool-use execution loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Planning turns per invocation
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Gateway attempts per invocation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Registry key used when the caller names no agent
    #[serde(default = "default_agent")]
    pub default_agent: String,
}

fn default_max_steps() -> u32 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_agent() -> String {
    "orchestrator".into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_retries: default_max_retries(),
            default_agent: default_agent(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_document_limit")]
    pub document_limit: usize,

    #[serde(default = "default_graph_limit")]
    pub graph_limit: usize,

    /// Azure AI Search endpoint (e.g. https://my-search.search.windows.net)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_index: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,

    /// JSON file with local documents, graph entities and session files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<String>,

    /// Files active in the current session
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_files: Vec<SessionFile>,
}

fn default_document_limit() -> usize {
    20
}
fn default_graph_limit() -> usize {
    10
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            document_limit: default_document_limit(),
            graph_limit: default_graph_limit(),
            search_endpoint: None,
            search_index: None,
            search_api_key: None,
            seed_file: None,
            session_files: vec![],
        }
    }
}

impl RetrievalConfig {
    /// True when a remote search service is fully configured.
    pub fn has_search_service(&self) -> bool {
        self.search_endpoint.is_some()
            && self.search_index.is_some()
            && self.search_api_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interpreter used for python snippets
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_sandbox_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_interpreter() -> String {
    "python3".into()
}
fn default_sandbox_timeout() -> u64 {
    30
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interpreter: default_interpreter(),
            timeout_secs: default_sandbox_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.quorum/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `QUORUM_API_KEY` (highest priority)
    /// - `AZURE_OPENAI_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply the same environment overrides as
    /// [`AppConfig::load`].
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("QUORUM_API_KEY")
                .ok()
                .or_else(|| std::env::var("AZURE_OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("QUORUM_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("QUORUM_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".quorum")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError("agent.max_steps must be > 0".into()));
        }

        if self.agent.max_retries == 0 {
            return Err(ConfigError::ValidationError("agent.max_retries must be > 0".into()));
        }

        if self.agent.default_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.default_agent must not be empty".into(),
            ));
        }

        if self.sandbox.enabled && self.sandbox.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sandbox.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentSettings::default(),
            retrieval: RetrievalConfig::default(),
            sandbox: SandboxConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
