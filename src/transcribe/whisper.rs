use crate::config::{Config, DEFAULT_API_BASE_URL};
use crate::error::{Result, SubburnError};
use crate::transcribe::Transcriber;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tracing::{debug, error};

/// Transcription endpoint, relative to the API root.
const TRANSCRIPTIONS_PATH: &str = "/audio/transcriptions";

/// Transcription model variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WhisperModel {
    #[default]
    Whisper1,
    Gpt4oTranscribe,
    Gpt4oMiniTranscribe,
    Other(String),
}

impl WhisperModel {
    pub fn as_str(&self) -> &str {
        match self {
            WhisperModel::Whisper1 => "whisper-1",
            WhisperModel::Gpt4oTranscribe => "gpt-4o-transcribe",
            WhisperModel::Gpt4oMiniTranscribe => "gpt-4o-mini-transcribe",
            WhisperModel::Other(name) => name,
        }
    }
}

impl From<&str> for WhisperModel {
    fn from(name: &str) -> Self {
        match name {
            "whisper-1" => WhisperModel::Whisper1,
            "gpt-4o-transcribe" => WhisperModel::Gpt4oTranscribe,
            "gpt-4o-mini-transcribe" => WhisperModel::Gpt4oMiniTranscribe,
            other => WhisperModel::Other(other.to_string()),
        }
    }
}

/// OpenAI audio transcription client requesting SRT output.
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: WhisperModel,
}

impl WhisperClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            model: WhisperModel::default(),
        }
    }

    /// Build a client from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.openai_api_key.clone().ok_or_else(|| {
            SubburnError::Config(
                "OpenAI API key not set. Set OPENAI_API_KEY environment variable.".to_string(),
            )
        })?;

        let mut client = Self::new(api_key)
            .with_base_url(config.api_base_url.clone())
            .with_model(WhisperModel::from(config.model.as_str()));
        if let Some(timeout) = config.request_timeout() {
            client = client.with_timeout(timeout)?;
        }
        Ok(client)
    }

    /// Point the client at a different API root (e.g. a proxy or a mock server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    /// Bound the whole request, upload included.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn model(&self) -> &WhisperModel {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, TRANSCRIPTIONS_PATH)
    }

    /// Build the multipart form, streaming the audio file rather than
    /// buffering it. The file handle is owned by the body and closed with it.
    async fn build_form(&self, audio_path: &Path, language: &str) -> Result<Form> {
        let file = File::open(audio_path).await?;
        let length = file.metadata().await?.len();
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let file_part = Part::stream_with_length(Body::from(file), length)
            .file_name(file_name)
            .mime_str("audio/wav")?;

        Ok(Form::new()
            .part("file", file_part)
            .text("model", self.model.as_str().to_string())
            .text("language", language.to_string())
            .text("response_format", "srt")
            .text("timestamp_granularities[]", "word")
            .text("include[]", "logprobs"))
    }

    async fn call_api(&self, form: Form) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Transcription API response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            debug!("Transcription API returned {} bytes", body.len());
            return Ok(body);
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to read transcription API error body: {}", e);
                String::new()
            }
        };
        error!("Transcription API error body: {}", error_body);

        let message = match serde_json::from_str::<ApiErrorResponse>(&error_body) {
            Ok(api_error) => match api_error.error.r#type {
                Some(kind) => format!("{} ({})", api_error.error.message, kind),
                None => api_error.error.message,
            },
            Err(_) if error_body.trim().is_empty() => status.to_string(),
            Err(_) => error_body.trim().to_string(),
        };

        Err(SubburnError::Api {
            status: status.as_u16(),
            message,
            body: error_body,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String> {
        debug!(
            "Transcribing {} with {} (language hint: {})",
            audio.display(),
            self.model.as_str(),
            language
        );

        let form = self.build_form(audio, language).await?;
        self.call_api(form).await
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    r#type: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    code: Option<String>,
}
