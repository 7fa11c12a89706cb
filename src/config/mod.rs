//! Configuration system (layered: code > env > config file).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RunError;

pub const DEFAULT_MODEL: &str = "o3";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

const CONFIG_DIR: &str = ".streamrun";
const CONFIG_FILE: &str = "config.toml";

/// On-disk shape of `~/.streamrun/config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug_events: Option<bool>,
}

/// Resolved configuration.
///
/// Resolution order (later wins):
/// 1. Built-in defaults
/// 2. `~/.streamrun/config.toml`
/// 3. Environment (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, `AGENT_MODEL`, `HOST`, `PORT`,
///    `AGENT_DEBUG_EVENTS`), with `.env` loaded first
/// 4. Explicit `with_*` setters
#[derive(Clone, PartialEq)]
pub struct StreamrunConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    model: String,
    host: String,
    port: u16,
    debug_events: bool,
}

impl fmt::Debug for StreamrunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamrunConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("debug_events", &self.debug_events)
            .finish()
    }
}

impl Default for StreamrunConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamrunConfig {
    /// Built-in defaults only.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug_events: false,
        }
    }

    /// `~/.streamrun/config.toml`, if a home directory can be found.
    pub fn default_path() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load defaults, the default config file, `.env`, and the process environment.
    pub fn load() -> Result<Self, RunError> {
        let _ = dotenvy::dotenv();
        let mut config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::new(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults overlaid with a TOML file. A missing file is not an error.
    pub fn from_file(path: &Path) -> Result<Self, RunError> {
        let mut config = Self::new();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(config);
        }
        let raw = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&raw).map_err(|e| {
            RunError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })?;
        config.apply_file(file);
        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(key) = file.api_key {
            self.api_key = Some(key);
        }
        if let Some(url) = file.base_url {
            self.base_url = Some(url);
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(debug_events) = file.debug_events {
            self.debug_events = debug_events;
        }
    }

    /// Overlay values from an environment lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = get("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(model) = get("AGENT_MODEL") {
            self.model = model;
        }
        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(port = %port, "ignoring invalid PORT"),
            }
        }
        if let Some(flag) = get("AGENT_DEBUG_EVENTS") {
            self.debug_events = !matches!(flag.trim(), "0" | "false" | "FALSE" | "no");
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_debug_events(mut self, enabled: bool) -> Self {
        self.debug_events = enabled;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn require_api_key(&self) -> Result<&str, RunError> {
        self.api_key().ok_or_else(|| {
            RunError::Configuration(
                "OPENAI_API_KEY is not set (environment, .env, or ~/.streamrun/config.toml)"
                    .to_string(),
            )
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn debug_events(&self) -> bool {
        self.debug_events
    }

    /// `host:port` for the relay server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
