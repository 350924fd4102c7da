use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Map relay errors to 4xx/5xx instead of always answering 200.
    #[serde(default)]
    pub strict_status: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            strict_status: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            temperature: None,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_model() -> String {
    "gemini-2.5-pro".into()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "chefcito_relay=info,tower_http=info".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|err| RelayError::Config(format!("failed to parse configuration: {err}")))
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("CHEFCITO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("CHEFCITO_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                self.server.port = parsed;
            }
        }
        if let Ok(strict) = env::var("CHEFCITO_STRICT_STATUS") {
            if let Ok(parsed) = strict.parse::<bool>() {
                self.server.strict_status = parsed;
            }
        }
        if let Ok(model) = env::var("CHEFCITO_MODEL") {
            self.model.model = model;
        }
        if let Ok(key) = env::var("API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Ok(key) = env::var("CHEFCITO_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Ok(endpoint) = env::var("CHEFCITO_GEMINI_ENDPOINT") {
            self.model.endpoint = Some(endpoint);
        }
        if let Ok(timeout) = env::var("CHEFCITO_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.model.timeout_secs = parsed;
            }
        }
        if let Ok(json) = env::var("CHEFCITO_LOG_JSON") {
            if let Ok(parsed) = json.parse::<bool>() {
                self.logging.json = parsed;
            }
        }
    }

    /// Startup checks. A missing API key is fatal for the process.
    pub fn validate(&self) -> Result<()> {
        match self.model.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(RelayError::Config(
                    "missing API key (set API_KEY or model.api_key)".into(),
                ))
            }
        }
        if self.model.model.trim().is_empty() {
            return Err(RelayError::Config("model identifier must not be empty".into()));
        }
        if self.model.timeout_secs == 0 {
            return Err(RelayError::Config("model.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
