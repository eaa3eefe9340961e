use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_CONFIG_FILE: &str = "reminders.toml";
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub web_base_url: String,
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub token_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".into(),
            web_base_url: "http://127.0.0.1:5173".into(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            request_timeout_seconds: 30,
            token_path: default_token_path(),
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    web_url: Option<String>,
    poll_interval_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
    token_path: Option<PathBuf>,
}

pub fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stables-crm")
        .join("token")
}

/// Defaults, then the TOML file, then environment overrides.
pub fn load_settings() -> ClientResult<Settings> {
    let path = std::env::var("REMINDERS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    load_settings_with(Some(&path), |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> ClientResult<Settings> {
    let mut settings = Settings::default();

    if let Some(path) = config_path.filter(|path| path.exists()) {
        let file_cfg = read_file_settings(path).map_err(|err| ClientError::Config(format!("{err:#}")))?;
        if let Some(v) = file_cfg.api_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.web_url {
            settings.web_base_url = v;
        }
        if let Some(v) = file_cfg.poll_interval_seconds {
            settings.poll_interval_seconds = v;
        }
        if let Some(v) = file_cfg.request_timeout_seconds {
            settings.request_timeout_seconds = v;
        }
        if let Some(v) = file_cfg.token_path {
            settings.token_path = v;
        }
    }

    if let Some(v) = env("CRM_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("CRM_WEB_URL") {
        settings.web_base_url = v;
    }
    if let Some(v) = env("APP__WEB_URL") {
        settings.web_base_url = v;
    }

    if let Some(v) = env("APP__POLL_INTERVAL_SECONDS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.poll_interval_seconds = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__POLL_INTERVAL_SECONDS"),
        }
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECONDS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_seconds = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECONDS"),
        }
    }

    if let Some(v) = env("APP__TOKEN_PATH") {
        settings.token_path = PathBuf::from(v);
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    settings.web_base_url = normalize_base_url(&settings.web_base_url)?;
    Ok(settings)
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file '{}'", path.display()))
}

pub fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::Config("base url must not be empty".into()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|err| ClientError::Config(format!("invalid base url '{trimmed}': {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "base url '{trimmed}' must use http or https"
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
