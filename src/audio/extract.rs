use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, SubburnError};
use crate::ffmpeg::Ffmpeg;
use crate::run_id::ArtifactPaths;

use super::{AudioMetadata, ExtractedAudio, CHANNELS, SAMPLE_RATE};

/// Extract the audio track of `input` into the run's WAV artifact.
///
/// Video streams are dropped and audio is transcoded to signed 16-bit
/// little-endian PCM, 44.1kHz stereo. A partially written file is left in
/// place when FFmpeg fails.
pub async fn extract_audio(
    ffmpeg: &Ffmpeg,
    input: &Path,
    artifacts: &ArtifactPaths,
) -> Result<ExtractedAudio> {
    let output = &artifacts.audio;
    info!("Extracting audio from {}", input.display());

    let sample_rate = SAMPLE_RATE.to_string();
    let channels = CHANNELS.to_string();
    ffmpeg
        .run([
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-vn"),
            OsStr::new("-acodec"),
            OsStr::new("pcm_s16le"),
            OsStr::new("-ar"),
            OsStr::new(&sample_rate),
            OsStr::new("-ac"),
            OsStr::new(&channels),
            output.as_os_str(),
        ])
        .await?;

    if !output.exists() {
        return Err(SubburnError::MissingOutput(output.clone()));
    }

    let metadata = match read_wav_header(output) {
        Ok(metadata) => {
            debug!(
                "Extracted {:.1}s at {} Hz, {} channel(s), {} bit",
                metadata.duration.as_secs_f64(),
                metadata.sample_rate,
                metadata.channels,
                metadata.bits_per_sample
            );
            if metadata.sample_rate != SAMPLE_RATE || metadata.channels != CHANNELS {
                warn!(
                    "Unexpected audio layout: {} Hz, {} channel(s)",
                    metadata.sample_rate, metadata.channels
                );
            }
            Some(metadata)
        }
        Err(e) => {
            warn!("Could not read WAV header of {}: {}", output.display(), e);
            None
        }
    };

    info!("Audio extracted to {}", output.display());

    Ok(ExtractedAudio {
        path: output.clone(),
        metadata,
    })
}

/// Read duration and sample layout from a WAV header.
pub fn read_wav_header(path: &Path) -> std::result::Result<AudioMetadata, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    // `duration()` counts frames, i.e. samples per channel.
    let frames = reader.duration();
    if spec.sample_rate == 0 {
        return Err(hound::Error::FormatError("sample rate is zero"));
    }

    Ok(AudioMetadata {
        duration: Duration::from_secs_f64(frames as f64 / spec.sample_rate as f64),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_id::RunId;

    fn write_wav(path: &Path, seconds: u32) {
        let spec = hound::WavSpec {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(SAMPLE_RATE * seconds) {
            for _ in 0..CHANNELS {
                writer.write_sample(0i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_wav_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2);

        let metadata = read_wav_header(&path).unwrap();
        assert_eq!(metadata.sample_rate, 44_100);
        assert_eq!(metadata.channels, 2);
        assert_eq!(metadata.bits_per_sample, 16);
        assert_eq!(metadata.duration, Duration::from_secs(2));
    }

    #[test]
    fn test_header_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.wav");
        std::fs::write(&path, b"definitely not riff").unwrap();
        assert!(read_wav_header(&path).is_err());
    }

    #[test]
    fn test_header_rejects_zero_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero-rate.wav");

        let mut header = Vec::new();
        header.extend_from_slice(b"RIFF");
        header.extend_from_slice(&40u32.to_le_bytes());
        header.extend_from_slice(b"WAVEfmt ");
        header.extend_from_slice(&16u32.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes()); // PCM
        header.extend_from_slice(&2u16.to_le_bytes()); // channels
        header.extend_from_slice(&0u32.to_le_bytes()); // sample rate
        header.extend_from_slice(&0u32.to_le_bytes()); // byte rate
        header.extend_from_slice(&4u16.to_le_bytes()); // block align
        header.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
        header.extend_from_slice(b"data");
        header.extend_from_slice(&4u32.to_le_bytes());
        header.extend_from_slice(&[0u8; 4]);
        std::fs::write(&path, &header).unwrap();

        let result = std::panic::catch_unwind(|| read_wav_header(&path));
        let header = result.expect("reading a zero-rate header must not panic");
        assert!(matches!(header, Err(hound::Error::FormatError(_))));
    }

    #[tokio::test]
    async fn test_extract_audio_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactPaths::new(dir.path(), &RunId::generate());
        let ffmpeg = Ffmpeg::new("/nonexistent/bin/ffmpeg");

        let result = extract_audio(&ffmpeg, Path::new("sample.mp4"), &artifacts).await;
        assert!(matches!(result, Err(SubburnError::ToolLaunch { .. })));
        assert!(!artifacts.audio.exists());
    }
}
