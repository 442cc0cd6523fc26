use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tuxseo_engine::{DispatchSettings, PageContext, PollPolicy};

use super::logging::LogDestination;

const ENV_BASE_URL: &str = "TUXSEO_BASE_URL";
const ENV_CSRF_TOKEN: &str = "TUXSEO_CSRF_TOKEN";
const ENV_SESSION_COOKIE: &str = "TUXSEO_SESSION_COOKIE";
const ENV_STORE_DIR: &str = "TUXSEO_STORE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
    pub backoff_factor: u32,
    pub max_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            max_attempts: policy.max_attempts,
            max_consecutive_errors: policy.max_consecutive_errors,
            backoff_factor: policy.backoff_factor,
            max_interval_ms: policy.max_interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Hidden-field token, highest precedence.
    pub csrf_token: Option<String>,
    pub meta_token: Option<String>,
    /// Full `Cookie` header; its `csrftoken` is the second token source.
    pub session_cookie: Option<String>,
    /// Saved dashboard page to read the hidden field and meta tag from.
    pub page_html: Option<PathBuf>,
    pub store_dir: PathBuf,
    pub log_destination: LogDestination,
    pub poll: PollConfig,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let dispatch = DispatchSettings::default();
        Self {
            base_url: "http://localhost:8000".to_string(),
            csrf_token: None,
            meta_token: None,
            session_cookie: None,
            page_html: None,
            store_dir: PathBuf::from(".tuxseo"),
            log_destination: LogDestination::default(),
            poll: PollConfig::default(),
            connect_timeout_secs: dispatch.connect_timeout.as_secs(),
            request_timeout_secs: dispatch.request_timeout.as_secs(),
        }
    }
}

impl AppConfig {
    /// Reads `path` (missing file means defaults) and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match fs::read_to_string(path) {
            Ok(text) => Self::from_ron_str(&text).map_err(|message| ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|err| err.to_string())
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(token) = lookup(ENV_CSRF_TOKEN) {
            self.csrf_token = Some(token);
        }
        if let Some(cookie) = lookup(ENV_SESSION_COOKIE) {
            self.session_cookie = Some(cookie);
        }
        if let Some(dir) = lookup(ENV_STORE_DIR) {
            self.store_dir = PathBuf::from(dir);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url is empty".to_string()));
        }
        if self.poll.interval_ms == 0 || self.poll.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "poll interval and attempt cap must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Token sources: configured values first, then anything found in the saved page.
    pub fn page_context(&self) -> Result<PageContext, ConfigError> {
        let mut page = match &self.page_html {
            Some(path) => {
                let html = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                PageContext::from_html(&html)
            }
            None => PageContext::default(),
        };
        if self.csrf_token.is_some() {
            page.hidden_field = self.csrf_token.clone();
        }
        if self.meta_token.is_some() {
            page.meta_token = self.meta_token.clone();
        }
        page.cookie_header = self.session_cookie.clone();
        Ok(page)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll.interval_ms),
            max_attempts: self.poll.max_attempts,
            max_consecutive_errors: self.poll.max_consecutive_errors,
            backoff_factor: self.poll.backoff_factor,
            max_interval: Duration::from_millis(self.poll.max_interval_ms),
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
