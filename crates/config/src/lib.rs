//! Configuration loading, validation, and management for DigiBuddy.
//!
//! Loads configuration from `~/.digibuddy/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Persona and tone instruction sent as the first message of every delegation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are DigiBuddy, a friendly and helpful AI assistant for a Digital Literacy Course designed to help parents and elderly users learn digital tools. \
Provide clear, simple explanations focused on practical advice. Keep your answers concise, friendly, and avoid technical jargon when possible. \
When appropriate, suggest relevant tutorials from our platform that might help the user learn more about the topic. \
Break down your instructions into numbered steps when providing how-to guidance.";

/// The root configuration structure.
///
/// Maps directly to `~/.digibuddy/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM provider used for delegation
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier sent with every delegation
    #[serde(default = "default_model")]
    pub model: String,

    /// Generation temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output-length ceiling per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Response resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}

/// Redact a secret string for Debug output.
const REDACTED: &str = "[REDACTED]";

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => REDACTED,
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("gateway", &self.gateway)
            .field("resolver", &self.resolver)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// HTTP client timeout; an expired request is reported as a provider error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins; empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Include the provider error detail next to a fallback reply.
    #[serde(default)]
    pub expose_errors: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: Vec::new(),
            expose_errors: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Replaces the generated fallback reply verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,

    /// Forward only the most recent N history turns. Unset forwards all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,

    /// TOML file of `[[entries]]`; unset uses the built-in knowledge base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_file: Option<PathBuf>,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            fallback_message: None,
            history_limit: None,
            knowledge_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.digibuddy/config.toml).
    ///
    /// Environment overrides:
    /// - `DIGIBUDDY_API_KEY`, then `OPENAI_API_KEY` (when no key is configured)
    /// - `DIGIBUDDY_PROVIDER`, `DIGIBUDDY_MODEL`
    /// - `PORT` (gateway port)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup("DIGIBUDDY_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("DIGIBUDDY_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("DIGIBUDDY_MODEL") {
            self.model = model;
        }

        if let Some(port) = lookup("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".digibuddy")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be > 0".into(),
            ));
        }

        if self.resolver.system_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "resolver.system_prompt must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Render the configuration as TOML for display, with API keys redacted.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        shown.api_key = shown.api_key.map(|_| REDACTED.into());
        for provider in shown.providers.values_mut() {
            provider.api_key = provider.api_key.take().map(|_| REDACTED.into());
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            resolver: ResolverConfig::default(),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key: &str| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.gateway.port, 5000);
        assert!(config.resolver.history_limit.is_none());
        assert!(!config.gateway.expose_errors);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.resolver.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let config = AppConfig {
            max_tokens: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "openai");
    }

    #[test]
    fn load_from_file_with_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gpt-4o-mini"
temperature = 0.3

[gateway]
port = 8080
expose_errors = true

[resolver]
history_limit = 10
knowledge_file = "/etc/digibuddy/knowledge.toml"

[providers.ollama]
api_url = "http://localhost:11434/v1"
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.gateway.port, 8080);
        assert!(config.gateway.expose_errors);
        assert_eq!(config.resolver.history_limit, Some(10));
        assert_eq!(config.providers["ollama"].timeout_secs, Some(30));
        assert_eq!(config.resolver.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = \"warm\"").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("DIGIBUDDY_MODEL", "gpt-4o"),
                ("PORT", "9000"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn configured_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config
            .apply_env(env(&[("DIGIBUDDY_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_port_env_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn toml_output_redacts_keys() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("OPENAI_API_KEY", "sk-from-env")]))
            .unwrap();
        config.providers.insert(
            "openrouter".into(),
            ProviderConfig {
                api_key: Some("sk-or-secret".into()),
                ..ProviderConfig::default()
            },
        );

        let shown = config.to_toml().unwrap();
        assert!(!shown.contains("sk-from-env"));
        assert!(!shown.contains("sk-or-secret"));
        assert!(shown.contains("[REDACTED]"));
        assert_eq!(config.api_key.as_deref(), Some("sk-from-env"));
    }
}
