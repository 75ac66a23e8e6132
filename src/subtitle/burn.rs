use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SubburnError};
use crate::ffmpeg::Ffmpeg;
use crate::run_id::ArtifactPaths;

/// Re-encode `input` with `subtitles` rendered into the frames, writing the
/// run's video artifact.
pub async fn burn_subtitles(
    ffmpeg: &Ffmpeg,
    input: &Path,
    subtitles: &Path,
    artifacts: &ArtifactPaths,
) -> Result<PathBuf> {
    let output = &artifacts.video;
    info!("Adding subtitles to {}", input.display());

    let filter = subtitles_filter(subtitles);
    ffmpeg
        .run([
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-vf"),
            filter.as_os_str(),
            output.as_os_str(),
        ])
        .await?;

    if !output.exists() {
        return Err(SubburnError::MissingOutput(output.clone()));
    }

    info!("Subtitled video written to {}", output.display());
    Ok(output.clone())
}

fn subtitles_filter(subtitles: &Path) -> OsString {
    let mut filter = OsString::from("subtitles=");
    filter.push(escape_filter_path(&subtitles.to_string_lossy()));
    filter
}

/// Escape a path for use as a filter option value inside a filtergraph.
///
/// FFmpeg unescapes twice: once when splitting the filtergraph and once when
/// parsing the filter's `key=value` options.
pub fn escape_filter_path(path: &str) -> String {
    escape(&escape(path, &['\\', '\'', ':']), &['\\', '\'', '[', ']', ',', ';'])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
