pub mod extract;

pub use extract::{extract_audio, read_wav_header};

use std::path::PathBuf;
use std::time::Duration;

/// Sample rate of the extracted waveform.
pub const SAMPLE_RATE: u32 = 44_100;

/// Channel count of the extracted waveform.
pub const CHANNELS: u16 = 2;

/// Metadata about an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMetadata {
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// Result of the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    pub path: PathBuf,
    /// `None` when the written file could not be read back as WAV.
    pub metadata: Option<AudioMetadata>,
}
