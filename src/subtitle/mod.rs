pub mod burn;

pub use burn::{burn_subtitles, escape_filter_path};

use crate::error::Result;
use crate::run_id::ArtifactPaths;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;

/// Write the transcript verbatim to the run's subtitle artifact.
///
/// An existing file of the same name is overwritten.
pub fn write_transcript(text: &str, artifacts: &ArtifactPaths) -> Result<PathBuf> {
    let path = &artifacts.transcript;
    fs::write(path, text)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    }

    info!("Transcription saved to {}", path.display());
    Ok(path.clone())
}

/// Number of SRT cues, counted by their timing lines.
pub fn count_cues(text: &str) -> usize {
    static TIMING: OnceLock<Regex> = OnceLock::new();
    let timing = TIMING.get_or_init(|| {
        Regex::new(r"(?m)^\s*\d{2,}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{2,}:\d{2}:\d{2}[,.]\d{3}")
            .expect("valid cue regex")
    });
    timing.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_id::RunId;

    const SAMPLE_SRT: &str = "1\n00:00:00,000 --> 00:00:02,500\nHello there.\n\n2\n00:00:02,500 --> 00:00:05,000\nGeneral Kenobi!\n\n";

    #[test]
    fn test_write_transcript_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactPaths::new(dir.path(), &RunId::generate());

        let text = "1\r\n00:00:00,000 --> 00:00:01,000\r\n  ünïcode  \r\n\r\n";
        let path = write_transcript(text, &artifacts).unwrap();

        assert_eq!(path, artifacts.transcript);
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_write_transcript_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactPaths::new(dir.path(), &RunId::generate());

        fs::write(&artifacts.transcript, "stale content that is longer").unwrap();
        write_transcript(SAMPLE_SRT, &artifacts).unwrap();
        assert_eq!(fs::read_to_string(&artifacts.transcript).unwrap(), SAMPLE_SRT);
    }

    #[test]
    fn test_write_transcript_empty() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactPaths::new(dir.path(), &RunId::generate());
        write_transcript("", &artifacts).unwrap();
        assert_eq!(fs::metadata(&artifacts.transcript).unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_transcript_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactPaths::new(dir.path(), &RunId::generate());
        write_transcript(SAMPLE_SRT, &artifacts).unwrap();

        let mode = fs::metadata(&artifacts.transcript).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_transcript_missing_dir() {
        let artifacts = ArtifactPaths::new(
            std::path::Path::new("/nonexistent/output"),
            &RunId::generate(),
        );
        assert!(write_transcript(SAMPLE_SRT, &artifacts).is_err());
    }

    #[test]
    fn test_count_cues() {
        assert_eq!(count_cues(SAMPLE_SRT), 2);
        assert_eq!(count_cues(""), 0);
        assert_eq!(count_cues("just some words"), 0);
    }
}
