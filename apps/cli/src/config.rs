use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use client_core::FileSessionStore;
use url::Url;

pub const CONFIG_FILE: &str = "slackr.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub session_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5005".into(),
            session_path: None,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    /// Command-line flags win over the file and the environment.
    pub fn with_flags(mut self, server_url: Option<String>, session_path: Option<PathBuf>) -> Self {
        if let Some(v) = server_url {
            self.server_url = v;
        }
        if let Some(v) = session_path {
            self.session_path = Some(v);
        }
        self
    }

    pub fn validated_server_url(&self) -> anyhow::Result<Url> {
        Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))
    }

    pub fn session_file(&self) -> anyhow::Result<PathBuf> {
        match &self.session_path {
            Some(path) => Ok(path.clone()),
            None => FileSessionStore::default_path()
                .ok_or_else(|| anyhow!("no local data directory; pass --session-path")),
        }
    }
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_from(path, |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("server_url") {
                    settings.server_url = v.clone();
                }
                if let Some(v) = file_cfg.get("session_path") {
                    settings.session_path = Some(PathBuf::from(v));
                }
                if let Some(v) = file_cfg.get("log_filter") {
                    settings.log_filter = v.clone();
                }
            }
            Err(err) => tracing::warn!(path = %path.display(), %err, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("SLACKR_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("SLACKR_SESSION_PATH") {
        settings.session_path = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__SESSION_PATH") {
        settings.session_path = Some(PathBuf::from(v));
    }

    if let Some(v) = env("SLACKR_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
