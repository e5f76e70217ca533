//! Configuration loading, validation, and management for crewloop.
//!
//! Loads configuration from `~/.crewloop/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crewloop_core::{DEFAULT_MAX_ITERATIONS, DEV_USER_ID};

/// The root configuration structure.
///
/// Maps directly to `~/.crewloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key. Absent = deterministic mock responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the Anthropic endpoint (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Seconds before a single model call is abandoned. Unset = no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Loop controller settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Memory store settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Identity settings
    #[serde(default)]
    pub identity: IdentityConfig,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}
fn default_max_tokens() -> u32 {
    4096
}

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
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("identity", &self.identity)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Upper bound on outer loop passes
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How many prior messages the plan prompt replays
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}
fn default_history_window() -> usize {
    5
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_window: default_history_window(),
        }
    }
}

/// Which memory store to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBackendKind {
    #[default]
    Sqlite,
    Postgres,
    InMemory,
    None,
}

impl std::fmt::Display for MemoryBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::InMemory => "in_memory",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub backend: MemoryBackendKind,

    /// SQLite database file
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,

    /// PostgreSQL connection string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Rows shown when reading history back
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

fn default_memory_path() -> PathBuf {
    AppConfig::config_dir().join("memory.sqlite")
}
fn default_fetch_limit() -> usize {
    20
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("database_url", &redact(&self.database_url))
            .field("fetch_limit", &self.fetch_limit)
            .finish()
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackendKind::default(),
            path: default_memory_path(),
            database_url: None,
            fetch_limit: default_fetch_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// The signed-in user, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Used when no user is signed in
    #[serde(default = "default_fallback_user")]
    pub fallback_user_id: String,
}

fn default_fallback_user() -> String {
    DEV_USER_ID.into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            fallback_user_id: default_fallback_user(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.crewloop/config.toml).
    ///
    /// Environment overrides, checked after the file:
    /// - `CREWLOOP_API_KEY`, then `ANTHROPIC_API_KEY` (only if the file has no key)
    /// - `CREWLOOP_MODEL`
    /// - `CREWLOOP_USER_ID`
    /// - `DATABASE_URL` (only if the file has none)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path, |key| std::env::var(key).ok())
    }

    /// Read `path`, apply overrides from `lookup`, then validate the result.
    pub fn load_with_env(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
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

        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("CREWLOOP_API_KEY").or_else(|| lookup("ANTHROPIC_API_KEY"));
        }
        if let Some(model) = lookup("CREWLOOP_MODEL") {
            self.model = model;
        }
        if let Some(user) = lookup("CREWLOOP_USER_ID") {
            self.identity.user_id = Some(user);
        }
        if self.memory.database_url.is_none() {
            self.memory.database_url = lookup("DATABASE_URL");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".crewloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than 0 when set".into(),
            ));
        }
        if self.agent.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_window must be greater than 0".into(),
            ));
        }
        if self.memory.fetch_limit == 0 {
            return Err(ConfigError::ValidationError(
                "memory.fetch_limit must be greater than 0".into(),
            ));
        }
        if self.memory.backend == MemoryBackendKind::Postgres && self.memory.database_url.is_none()
        {
            return Err(ConfigError::ValidationError(
                "memory.backend = \"postgres\" requires memory.database_url or DATABASE_URL".into(),
            ));
        }
        Ok(())
    }

    /// Whether a real model will be called (otherwise responses are mocked).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: None,
            agent: AgentSettings::default(),
            memory: MemoryConfig::default(),
            identity: IdentityConfig::default(),
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
