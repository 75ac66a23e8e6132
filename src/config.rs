use crate::error::{Result, SubburnError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default OpenAI API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default transcription model.
pub const DEFAULT_MODEL: &str = "whisper-1";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    /// Media tool binary; resolved through `PATH` when not absolute.
    pub ffmpeg_path: PathBuf,
    /// Per-request timeout for the transcription call. Transport default when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load a `.env` file from the working directory or one of its parents
    /// into the process environment.
    ///
    /// Variables that are already set win over the file. A missing file is
    /// not an error; an unreadable or malformed one is.
    pub fn load_dotenv() -> Result<Option<PathBuf>> {
        match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(SubburnError::Config(format!("Failed to load .env file: {e}"))),
        }
    }

    /// Like [`Config::load_dotenv`] for an explicit file. Returns whether it existed.
    pub fn load_dotenv_from(path: &Path) -> Result<bool> {
        match dotenvy::from_path(path) {
            Ok(()) => Ok(true),
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(SubburnError::Config(format!(
                "Failed to load {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = Self::from_toml(&contents)?;
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| SubburnError::Config(format!("Failed to parse config file: {e}")))
    }

    /// Override fields from environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(model) = lookup("SUBBURN_MODEL") {
            self.model = model;
        }
        if let Some(path) = lookup("SUBBURN_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(timeout) = lookup("SUBBURN_REQUEST_TIMEOUT") {
            let secs = timeout.trim().parse().map_err(|_| {
                SubburnError::Config(format!(
                    "SUBBURN_REQUEST_TIMEOUT must be a whole number of seconds, got '{timeout}'"
                ))
            })?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.openai_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(SubburnError::Config(
                    "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-..."
                        .to_string(),
                ));
            }
        }

        if self.request_timeout_secs == Some(0) {
            return Err(SubburnError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subburn").join("config.toml"))
    }
}
