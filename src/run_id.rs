use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::{Path, PathBuf};

const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp-derived identifier shared by every artifact of one run.
///
/// Second resolution only: two runs started within the same second into the
/// same directory collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Read the local clock once and format it as `YYYYMMDD_HHMMSS`.
    pub fn generate() -> Self {
        Self::from_datetime(&Local::now().naive_local())
    }

    pub fn from_datetime(at: &NaiveDateTime) -> Self {
        RunId(at.format(RUN_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Paths of the three files a run produces, all in one flat directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub audio: PathBuf,
    pub transcript: PathBuf,
    pub video: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, run_id: &RunId) -> Self {
        Self {
            audio: output_dir.join(format!("audio-{run_id}.wav")),
            transcript: output_dir.join(format!("transcription-{run_id}.svr")),
            video: output_dir.join(format!("transcribed-{run_id}.mp4")),
        }
    }

    /// Artifacts currently present on disk, in production order.
    pub fn existing(&self) -> Vec<&Path> {
        [&self.audio, &self.transcript, &self.video]
            .into_iter()
            .map(PathBuf::as_path)
            .filter(|p| p.exists())
            .collect()
    }
}
