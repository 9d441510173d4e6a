//! Configuration (layered: explicit overrides > env / `.env` > config file).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WarbotError;

pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["OPENAI_API_KEY", "OPENAI_APIKEY"];

/// Runtime settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarbotConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub max_rounds: Option<usize>,
    #[serde(skip)]
    pub debug: bool,
}

impl fmt::Debug for WarbotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarbotConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_rounds", &self.max_rounds)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Default for WarbotConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            max_rounds: None,
            debug: false,
        }
    }
}

impl WarbotConfig {
    /// Load from environment variables (and `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::default().with_env_from(|key| std::env::var(key).ok())
    }

    /// Config file, then environment on top.
    pub fn load() -> Result<Self, WarbotError> {
        let _ = dotenvy::dotenv();
        let file = match std::env::var_os("WARBOT_CONFIG") {
            Some(path) => Some(PathBuf::from(path)),
            None => default_config_path(),
        };
        let base = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        Ok(base.with_env_from(|key| std::env::var(key).ok()))
    }

    /// Read a TOML config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, WarbotError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&text).map_err(|err| {
            WarbotError::Configuration(format!("{}: {err}", path.display()))
        })
    }

    /// Overlay values from an environment lookup. Empty values are ignored.
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_ENV_VARS.iter().find_map(|var| get(var)) {
            self.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(rounds) = get("WARBOT_MAX_ROUNDS").and_then(|v| v.trim().parse().ok()) {
            self.max_rounds = Some(rounds);
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The API key, or a configuration error naming where to set it.
    pub fn require_api_key(&self) -> Result<&str, WarbotError> {
        self.api_key.as_deref().ok_or_else(|| {
            WarbotError::Configuration(
                "OpenAI API key is required. Set OPENAI_API_KEY in environment or .env file.".into(),
            )
        })
    }
}

/// `<config dir>/warbot/config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "warbot").map(|dirs| dirs.config_dir().join("config.toml"))
}
