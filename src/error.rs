use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One of the four ordered operations composing a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractAudio,
    Transcribe,
    WriteTranscript,
    BurnSubtitles,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ExtractAudio => write!(f, "audio extraction"),
            Stage::Transcribe => write!(f, "transcription"),
            Stage::WriteTranscript => write!(f, "transcript write"),
            Stage::BurnSubtitles => write!(f, "subtitle burn"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SubburnError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {diagnostics}")]
    ToolFailed {
        tool: String,
        status: String,
        diagnostics: String,
    },

    #[error("Expected output was not created: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<SubburnError>,
    },
}

impl SubburnError {
    /// Attach the failing stage to an error.
    pub fn in_stage(self, stage: Stage) -> Self {
        SubburnError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was raised in, if it came out of the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SubburnError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SubburnError>;
