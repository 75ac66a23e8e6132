pub mod whisper;

pub use whisper::{WhisperClient, WhisperModel};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Speech-to-text backend producing subtitle-formatted text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio at `audio`, returning the service's subtitle body verbatim.
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
