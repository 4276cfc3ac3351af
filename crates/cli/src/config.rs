//! Configuration loading: TOML file, defaults, and environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use proto::ConfigError;
use serde::{Deserialize, Serialize};
use session::WelcomeSchedule;
use tracing::debug;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Assistant endpoint configuration.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Chat session behaviour.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Assistant endpoint (`POST /chat`) config.
///
/// Configure via `[endpoint]` in `config.toml` or environment variables:
/// - `CALCHAT_ENDPOINT_URL`: base URL of the assistant server
/// - `CALCHAT_TIMEOUT_SECS`: per-request timeout in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL; `/chat` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Path of the sign-in page, relative to `base_url`.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_login_path() -> String {
    "/login".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            login_path: default_login_path(),
        }
    }
}

impl EndpointConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full sign-in URL shown when the endpoint answers 401.
    pub fn login_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.login_path.trim_start_matches('/')
        )
    }
}

/// Chat session config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Play the greeting when a session starts.
    #[serde(default = "default_welcome")]
    pub welcome: bool,
    /// Delay before the greeting, in milliseconds.
    #[serde(default = "default_greeting_delay_ms")]
    pub greeting_delay_ms: u64,
    /// Delay between greeting and capability summary, in milliseconds.
    #[serde(default = "default_summary_delay_ms")]
    pub summary_delay_ms: u64,
}

fn default_welcome() -> bool {
    true
}

fn default_greeting_delay_ms() -> u64 {
    500
}

fn default_summary_delay_ms() -> u64 {
    800
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            welcome: default_welcome(),
            greeting_delay_ms: default_greeting_delay_ms(),
            summary_delay_ms: default_summary_delay_ms(),
        }
    }
}

impl SessionConfig {
    /// Welcome timing derived from the configured delays.
    pub fn welcome_schedule(&self) -> WelcomeSchedule {
        WelcomeSchedule {
            greeting_delay: Duration::from_millis(self.greeting_delay_ms),
            summary_delay: Duration::from_millis(self.summary_delay_ms),
        }
    }
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Look in current dir, then home dir
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home_config = Self::home_dir()?.join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        debug!(
            base_url = %config.endpoint.base_url,
            timeout_secs = config.endpoint.timeout_secs,
            welcome = config.session.welcome,
            "Config loaded"
        );
        Ok(config)
    }

    /// `~/.calchat`, when `HOME` is set.
    pub fn home_dir() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".calchat"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CALCHAT_ENDPOINT_URL") {
            self.endpoint.base_url = url;
        }
        if let Ok(secs) = std::env::var("CALCHAT_TIMEOUT_SECS")
            && let Ok(secs) = secs.parse::<u64>()
        {
            self.endpoint.timeout_secs = secs;
        }
        if std::env::var_os("CALCHAT_NO_WELCOME").is_some() {
            self.session.welcome = false;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("endpoint.base_url".to_string()));
        }
        if self.endpoint.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "endpoint.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
