//! Configuration models for issue-planner.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! The user resolves these unknowns at runtime via config file or environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Provider names accepted by [`Config::validate`].
pub const VALID_PROVIDERS: [&str; 2] = ["anthropic", "mock"];

/// Annotated example configuration file.
pub const EXAMPLE_CONFIG: &str = r#"# issue-planner configuration file

[server]
bind_addr = "127.0.0.1"
port = 8000  # API_PORT overrides

[logging]
level = "info"  # error, warn, info, debug, trace (LOG_LEVEL overrides)
dir = "logs"    # combined.log and error.log; "" disables file output

[llm]
provider = "mock"  # "mock" or "anthropic" (LLM_PROVIDER overrides)
mock_delay_ms = 500

[llm.anthropic]
# API key (can also use ANTHROPIC_API_KEY env var)
# api_key = "${ANTHROPIC_API_KEY}"
api_key_env = "ANTHROPIC_API_KEY"
model = "claude-3-opus-20240229"  # ANTHROPIC_MODEL overrides
base_url = "https://api.anthropic.com/v1/messages"
max_retries = 3
timeout_secs = 60
retry_base_delay_ms = 1000
"#;

/// Top-level configuration for issue-planner.
///
/// I^R resolved: All configurable parameters are explicit, every section
/// has defaults so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// LLM provider selection and provider settings
    #[serde(default)]
    pub llm: LlmConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum level: error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for combined.log and error.log (empty disables file output)
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

/// LLM client configuration.
///
/// K_i: Unknown or empty provider names select the mock client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name ("anthropic" or "mock")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Simulated latency of the mock client in milliseconds
    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,

    /// Anthropic settings (only read when provider is "anthropic")
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_mock_delay_ms() -> u64 {
    500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            mock_delay_ms: default_mock_delay_ms(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

/// Anthropic Messages API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} placeholders)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is not set
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Messages endpoint URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum attempts per call (the first attempt counts)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Backoff unit: attempt n waits 2^n times this many milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_model() -> String {
    "claude-3-opus-20240229".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout() -> u64 {
    60
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl AnthropicConfig {
    /// Resolve API key from config or environment.
    ///
    /// B_i(api key available) → Result
    /// Empty values and placeholders naming unset variables count as missing.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.api_key {
            let key = expand_env_vars(key);
            if !key.trim().is_empty() && !ENV_PLACEHOLDER.is_match(&key) {
                return Ok(key);
            }
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load configuration for the service.
    ///
    /// A missing file falls back to defaults. Environment overrides are
    /// applied on top of whatever was loaded.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// Recognized variables: API_PORT, LOG_LEVEL, LLM_PROVIDER,
    /// ANTHROPIC_API_KEY, ANTHROPIC_MODEL. The lookup is injected so
    /// callers can supply something other than the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("API_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "API_PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.llm.anthropic.api_key = Some(key);
        }
        if let Some(model) = lookup("ANTHROPIC_MODEL") {
            self.llm.anthropic.model = model;
        }
        Ok(())
    }

    /// Validate the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be a valid port number (1-65535)".to_string());
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            errors.push(format!(
                "logging.level must be one of: error, warn, info, debug, trace (got '{}')",
                self.logging.level
            ));
        }

        if !VALID_PROVIDERS.contains(&self.llm.provider.as_str()) {
            errors.push(format!(
                "llm.provider must be one of: {}",
                VALID_PROVIDERS.join(", ")
            ));
        }

        if self.llm.provider == "anthropic" {
            if let Err(e) = self.llm.anthropic.resolve_api_key() {
                errors.push(e.to_string());
            }
            if self.llm.anthropic.model.trim().is_empty() {
                errors.push(
                    "llm.anthropic.model is required when provider is set to anthropic"
                        .to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

static ENV_PLACEHOLDER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex"));

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    for cap in ENV_PLACEHOLDER.captures_iter(s) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
///
/// Epistemic origin:
/// - B_i falsified: File not found, parse error, invalid values
/// - I^B materialized: Missing required values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing Anthropic API key: set {env_var} env var or llm.anthropic.api_key in config")]
    MissingApiKey { env_var: String },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Configuration validation failed:\n- {}", .0.join("\n- "))]
    Invalid(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const UNSET_ENV: &str = "ISSUE_PLANNER_TEST_UNSET_API_KEY";

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.mock_delay_ms, 500);
        assert_eq!(config.llm.anthropic.max_retries, 3);
        assert_eq!(
            config.llm.anthropic.base_url,
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.anthropic.model, "claude-3-opus-20240229");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[llm]
provider = "anthropic"

[llm.anthropic]
api_key = "sk-test"
model = "claude-test"
max_retries = 5
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.anthropic.model, "claude-test");
        assert_eq!(config.llm.anthropic.max_retries, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env_from(&[
                ("API_PORT", "9000"),
                ("LOG_LEVEL", "debug"),
                ("LLM_PROVIDER", "anthropic"),
                ("ANTHROPIC_API_KEY", "sk-env"),
                ("ANTHROPIC_MODEL", "claude-env"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.anthropic.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.llm.anthropic.model, "claude-env");
    }

    #[test]
    fn test_env_override_bad_port() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(env_from(&[("API_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == "API_PORT"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        config.logging.level = "http".to_string();
        config.llm.provider = "openai".to_string();

        match config.validate() {
            Err(ConfigError::Invalid(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_anthropic_requires_key_and_model() {
        let mut config = Config::default();
        config.llm.provider = "anthropic".to_string();
        config.llm.anthropic.api_key = None;
        config.llm.anthropic.api_key_env = UNSET_ENV.to_string();
        config.llm.anthropic.model = String::new();

        match config.validate() {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains(UNSET_ENV));
                assert!(errors[1].contains("model"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_api_key_rejects_empty() {
        let config = AnthropicConfig {
            api_key: Some("   ".to_string()),
            api_key_env: UNSET_ENV.to_string(),
            ..AnthropicConfig::default()
        };
        assert!(matches!(
            config.resolve_api_key(),
            Err(ConfigError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_resolve_api_key_rejects_unexpanded_placeholder() {
        let config = AnthropicConfig {
            api_key: Some("${ISSUE_PLANNER_TEST_NOT_SET}".to_string()),
            api_key_env: UNSET_ENV.to_string(),
            ..AnthropicConfig::default()
        };
        match config.resolve_api_key() {
            Err(ConfigError::MissingApiKey { env_var }) => assert_eq!(env_var, UNSET_ENV),
            other => panic!("expected missing key, got {other:?}"),
        }

        let config = AnthropicConfig {
            api_key: Some("sk-${ISSUE_PLANNER_TEST_NOT_SET}".to_string()),
            api_key_env: UNSET_ENV.to_string(),
            ..AnthropicConfig::default()
        };
        assert!(config.resolve_api_key().is_err());
    }

    #[test]
    fn test_validate_anthropic_rejects_unexpanded_placeholder() {
        let mut config = Config::default();
        config.llm.provider = "anthropic".to_string();
        config.llm.anthropic.api_key = Some("${ISSUE_PLANNER_TEST_NOT_SET}".to_string());
        config.llm.anthropic.api_key_env = UNSET_ENV.to_string();

        match config.validate() {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains(UNSET_ENV));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_env_vars_leaves_unknown_placeholder() {
        assert_eq!(
            expand_env_vars("${ISSUE_PLANNER_TEST_NOT_SET}"),
            "${ISSUE_PLANNER_TEST_NOT_SET}"
        );
        assert_eq!(expand_env_vars("plain"), "plain");
    }
}
