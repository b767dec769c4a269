use gateway::{AuthContext, GatewayConfig};
use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote service.
    pub api_base_url: String,
    /// Optional client-side timeout for message sends, in milliseconds.
    /// Unset means a send waits as long as the server takes to reply.
    pub timeout_ms: Option<u64>,
    /// Bearer credential attached to requests when present.
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_ms: None,
            token: None,
        }
    }
}

impl Config {
    /// Loads configuration from explicit path, fallback locations, and env
    /// overrides (`MEDILINK_API_URL`, `MEDILINK_TOKEN`, `MEDILINK_TIMEOUT_MS`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            // Look in current dir, then home dir
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home = std::env::var("HOME").ok()?;
            let home_config = PathBuf::from(home).join(".medilink").join("config.toml");
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

        // Environment variable overrides (highest priority)
        if let Ok(url) = std::env::var("MEDILINK_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(token) = std::env::var("MEDILINK_TOKEN") {
            config.token = Some(token);
        }
        if let Ok(timeout) = std::env::var("MEDILINK_TIMEOUT_MS")
            && let Ok(ms) = timeout.parse::<u64>()
        {
            config.timeout_ms = Some(ms);
        }

        config.validate()?;
        debug!(base_url = %config.api_base_url, "Config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api_base_url".to_string()));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }
        Ok(())
    }

    /// Gateway connection settings derived from this config.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            api_base_url: self.api_base_url.clone(),
            timeout_ms: self.timeout_ms,
        }
    }

    /// Credential context derived from this config.
    pub fn auth_context(&self) -> AuthContext {
        match &self.token {
            Some(token) => AuthContext::with_token(token.clone()),
            None => AuthContext::anonymous(),
        }
    }
}
