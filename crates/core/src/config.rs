//! Runtime settings: the API key and where/how to reach the API.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::PipelineError;
use crate::ports::Result;

pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const BASE_URL_VAR: &str = "YOUTUBE_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// YouTube Data API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(PipelineError::MissingApiKey);
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// How to reach the videos endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchSettings {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(PipelineError::Config(format!(
                "base URL must start with http:// or https://, got {base_url:?}"
            )));
        }
        if timeout.is_zero() {
            return Err(PipelineError::Config("timeout must be greater than zero".into()));
        }
        Ok(Self { base_url, timeout })
    }

    pub fn videos_endpoint(&self) -> String {
        format!("{}/youtube/v3/videos", self.base_url)
    }
}

/// Loads the API key the way the tool documents it: the process
/// environment wins, otherwise `env_file` (default `./.env`) is read.
pub fn load_api_key(env_file: Option<&Path>) -> Result<ApiKey> {
    let path = env_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
    resolve_api_key(std::env::var(API_KEY_VAR).ok(), &path)
}

/// Resolution logic behind [`load_api_key`], with the environment value
/// passed in. The `.env` file is read without touching the process
/// environment; a missing file only means "no key there".
pub fn resolve_api_key(from_env: Option<String>, env_file: &Path) -> Result<ApiKey> {
    if let Some(key) = from_env.filter(|k| !k.trim().is_empty()) {
        debug!("using API key from the environment");
        return ApiKey::new(key);
    }

    let entries = match dotenvy::from_path_iter(env_file) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            debug!(path = %env_file.display(), "no env file");
            return Err(PipelineError::MissingApiKey);
        }
        Err(e) => {
            return Err(PipelineError::Config(format!(
                "cannot read {}: {e}",
                env_file.display()
            )))
        }
    };

    for entry in entries {
        let (name, value) = entry.map_err(|e| {
            PipelineError::Config(format!("cannot parse {}: {e}", env_file.display()))
        })?;
        if name == API_KEY_VAR {
            debug!(path = %env_file.display(), "using API key from env file");
            return ApiKey::new(value);
        }
    }

    Err(PipelineError::MissingApiKey)
}
