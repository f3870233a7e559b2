//! App home resolution and `config.toml` loading.
//!
//! Everything here is optional: with no home directory, no config file,
//! and no environment overrides, the defaults talk to the public OpenAI
//! endpoint with the original app's model.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// Total per-request timeout.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Partial `config.toml` shape; every field optional.
#[derive(Debug, Deserialize)]
struct ConfigToml {
    model: Option<String>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load `config.toml` from the app home, falling back to defaults
    /// for anything missing or unparseable.
    pub fn load(app_home: &Path) -> Self {
        let mut config = Self::default();
        let config_file = app_home.join("config.toml");
        if !config_file.exists() {
            return config;
        }

        match std::fs::read_to_string(&config_file) {
            Ok(content) => match toml::from_str::<ConfigToml>(&content) {
                Ok(parsed) => {
                    if let Some(model) = parsed.model {
                        config.model = model;
                    }
                    if let Some(base_url) = parsed.base_url {
                        config.base_url = base_url;
                    }
                    if let Some(timeout) = parsed.request_timeout_secs {
                        config.request_timeout_secs = timeout;
                    }
                    debug!(
                        "config loaded: model={}, base_url={}",
                        config.model, config.base_url
                    );
                }
                Err(e) => warn!("ignoring malformed {}: {e}", config_file.display()),
            },
            Err(e) => warn!("could not read {}: {e}", config_file.display()),
        }

        config
    }
}

/// The app home directory: `RAFIQ_HOME` if set, otherwise `~/.rafiq`.
pub fn app_home() -> crate::Result<PathBuf> {
    if let Ok(home) = std::env::var("RAFIQ_HOME") {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        crate::RafiqError::Config("could not find home directory".to_string())
    })?;
    Ok(home.join(".rafiq"))
}
