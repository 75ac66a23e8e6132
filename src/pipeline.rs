use crate::audio::{extract_audio, AudioMetadata};
use crate::config::Config;
use crate::error::{Result, Stage};
use crate::ffmpeg::Ffmpeg;
use crate::run_id::{ArtifactPaths, RunId};
use crate::subtitle::{burn_subtitles, count_cues, write_transcript};
use crate::transcribe::{Transcriber, WhisperClient};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What to transcribe and where the artifacts go.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    /// Source video; only ever read.
    pub video: PathBuf,
    /// Flat directory receiving all artifacts of the run.
    pub output_dir: PathBuf,
    /// Language hint passed to the transcription service.
    pub language: String,
}

impl TranscribeRequest {
    pub fn new(video: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            output_dir: output_dir.into(),
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Progress of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    AudioExtracted,
    Transcribed,
    TranscriptWritten,
    SubtitlesBurned,
    Aborted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "init",
            PipelineState::AudioExtracted => "audio extracted",
            PipelineState::Transcribed => "transcribed",
            PipelineState::TranscriptWritten => "transcript written",
            PipelineState::SubtitlesBurned => "subtitles burned",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Timings of each stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub total_time: Duration,
    pub extraction_time: Duration,
    pub transcription_time: Duration,
    pub write_time: Duration,
    pub burn_time: Duration,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: RunId,
    pub artifacts: ArtifactPaths,
    pub audio: Option<AudioMetadata>,
    pub cue_count: usize,
    pub provider: String,
    pub stats: PipelineStats,
}

/// Runs extract → transcribe → write → burn, stopping at the first failure.
pub struct Pipeline<'a> {
    ffmpeg: Ffmpeg,
    transcriber: &'a dyn Transcriber,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(ffmpeg: Ffmpeg, transcriber: &'a dyn Transcriber) -> Self {
        Self {
            ffmpeg,
            transcriber,
            show_progress: true,
        }
    }

    /// Enable or disable progress spinners.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run every stage for `request`, naming artifacts after `run_id`.
    ///
    /// Artifacts produced before a failure are left on disk.
    pub async fn run(&self, run_id: &RunId, request: &TranscribeRequest) -> Result<PipelineResult> {
        let artifacts = ArtifactPaths::new(&request.output_dir, run_id);
        info!("Run {} started", run_id);

        let result = self.run_stages(run_id, request, &artifacts).await;

        if let Err(ref e) = result {
            transition(PipelineState::Aborted);
            let left = artifacts.existing();
            if !left.is_empty() {
                warn!(
                    "Run {} aborted ({}); keeping artifacts: {}",
                    run_id,
                    e,
                    left.iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }

        result
    }

    async fn run_stages(
        &self,
        run_id: &RunId,
        request: &TranscribeRequest,
        artifacts: &ArtifactPaths,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let progress = self.show_progress.then(MultiProgress::new);
        transition(PipelineState::Init);

        // Stage 1: audio extraction
        info!("Stage 1/4: Extracting audio from {}", request.video.display());
        let spinner = stage_spinner(progress.as_ref(), "Extracting audio...");
        let stage_start = Instant::now();

        let extracted = match self.ffmpeg.check().await {
            Ok(()) => extract_audio(&self.ffmpeg, &request.video, artifacts).await,
            Err(e) => Err(e),
        };
        let audio = abandon_on_error(spinner.as_ref(), extracted)
            .map_err(|e| e.in_stage(Stage::ExtractAudio))?;

        let extraction_time = stage_start.elapsed();
        finish(spinner, "✓ Audio extracted");
        transition(PipelineState::AudioExtracted);

        // Stage 2: transcription
        info!(
            "Stage 2/4: Transcribing with {} (language: {})",
            self.transcriber.name(),
            request.language
        );
        let spinner = stage_spinner(progress.as_ref(), "Transcribing audio...");
        let stage_start = Instant::now();

        let transcribed = self
            .transcriber
            .transcribe(&audio.path, &request.language)
            .await;
        let transcript = abandon_on_error(spinner.as_ref(), transcribed)
            .map_err(|e| e.in_stage(Stage::Transcribe))?;

        let transcription_time = stage_start.elapsed();
        let cue_count = count_cues(&transcript);
        finish(spinner, &format!("✓ Transcribed ({cue_count} cues)"));
        transition(PipelineState::Transcribed);

        // Stage 3: transcript artifact
        info!("Stage 3/4: Writing transcript");
        let stage_start = Instant::now();

        let subtitle_path =
            write_transcript(&transcript, artifacts).map_err(|e| e.in_stage(Stage::WriteTranscript))?;

        let write_time = stage_start.elapsed();
        transition(PipelineState::TranscriptWritten);

        // Stage 4: burn subtitles
        info!("Stage 4/4: Burning subtitles into video");
        let spinner = stage_spinner(progress.as_ref(), "Burning subtitles...");
        let stage_start = Instant::now();

        let burned = burn_subtitles(&self.ffmpeg, &request.video, &subtitle_path, artifacts).await;
        abandon_on_error(spinner.as_ref(), burned).map_err(|e| e.in_stage(Stage::BurnSubtitles))?;

        let burn_time = stage_start.elapsed();
        finish(spinner, "✓ Subtitles burned");
        transition(PipelineState::SubtitlesBurned);

        Ok(PipelineResult {
            run_id: run_id.clone(),
            artifacts: artifacts.clone(),
            audio: audio.metadata,
            cue_count,
            provider: self.transcriber.name().to_string(),
            stats: PipelineStats {
                total_time: start_time.elapsed(),
                extraction_time,
                transcription_time,
                write_time,
                burn_time,
            },
        })
    }
}

/// Validate configuration, then run the whole pipeline under a fresh run id.
///
/// A missing API key fails here, before any subprocess is started.
pub async fn transcribe_video(
    config: &Config,
    request: &TranscribeRequest,
    show_progress: bool,
) -> Result<PipelineResult> {
    let run_id = RunId::generate();
    config.validate()?;
    let client = WhisperClient::from_config(config)?;

    Pipeline::new(Ffmpeg::new(config.ffmpeg_path.clone()), &client)
        .with_progress(show_progress)
        .run(&run_id, request)
        .await
}

fn transition(state: PipelineState) {
    debug!("Pipeline state: {}", state);
}

fn stage_spinner(progress: Option<&MultiProgress>, message: &str) -> Option<ProgressBar> {
    progress.map(|mp| {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    })
}

fn finish(spinner: Option<ProgressBar>, message: &str) {
    if let Some(pb) = spinner {
        pb.finish_with_message(message.to_string());
    }
}

/// Leave a failed stage's spinner showing the error instead of its last message.
fn abandon_on_error<T>(spinner: Option<&ProgressBar>, result: Result<T>) -> Result<T> {
    if let (Some(pb), Err(e)) = (spinner, &result) {
        pb.abandon_with_message(format!("✗ {e}"));
    }
    result
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Transcription Complete                    ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Run:        {}", result.run_id);
    println!("  Audio:      {}", result.artifacts.audio.display());
    println!("  Subtitles:  {}", result.artifacts.transcript.display());
    println!("  Video:      {}", result.artifacts.video.display());
    println!("  Cues:       {}", result.cue_count);
    println!("  Provider:   {}", result.provider);
    if let Some(ref audio) = result.audio {
        println!(
            "  Duration:   {:.1}s audio ({} Hz, {} ch)",
            audio.duration.as_secs_f64(),
            audio.sample_rate,
            audio.channels
        );
    }
    println!();
    println!("  Timing:");
    println!("    Extract:     {:.2}s", result.stats.extraction_time.as_secs_f64());
    println!("    Transcribe:  {:.2}s", result.stats.transcription_time.as_secs_f64());
    println!("    Write:       {:.2}s", result.stats.write_time.as_secs_f64());
    println!("    Burn:        {:.2}s", result.stats.burn_time.as_secs_f64());
    println!("    Total:       {:.2}s", result.stats.total_time.as_secs_f64());
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::SubburnError;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        async fn transcribe(&self, _audio: &Path, _language: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn test_request_defaults() {
        let request = TranscribeRequest::new("sample.mp4", "/tmp/out");
        assert_eq!(request.language, "en");
        assert_eq!(request.with_language("ja").language, "ja");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Init.to_string(), "init");
        assert_eq!(PipelineState::SubtitlesBurned.to_string(), "subtitles burned");
    }

    #[test]
    fn test_failed_stage_abandons_spinner() {
        let pb = ProgressBar::hidden();
        pb.set_message("Extracting audio...");

        let result: Result<()> = abandon_on_error(
            Some(&pb),
            Err(SubburnError::Config("boom".to_string())),
        );

        assert!(result.is_err());
        assert!(pb.is_finished());
        assert!(pb.message().starts_with("✗"), "{}", pb.message());
        assert!(pb.message().contains("boom"));
    }

    #[test]
    fn test_successful_stage_keeps_spinner_running() {
        let pb = ProgressBar::hidden();
        pb.set_message("Transcribing audio...");

        let result = abandon_on_error(Some(&pb), Ok(3));

        assert_eq!(result.unwrap(), 3);
        assert!(!pb.is_finished());
        assert_eq!(pb.message(), "Transcribing audio...");
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_later_stages() {
        let dir = tempfile::tempdir().unwrap();
        let transcriber = CountingTranscriber {
            calls: AtomicUsize::new(0),
        };
        let pipeline =
            Pipeline::new(Ffmpeg::new("/nonexistent/bin/ffmpeg"), &transcriber).with_progress(false);
        let request = TranscribeRequest::new("sample.mp4", dir.path());

        let err = pipeline
            .run(&RunId::generate(), &request)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::ExtractAudio));
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_media_tool() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            openai_api_key: None,
            ffmpeg_path: PathBuf::from("/nonexistent/bin/ffmpeg"),
            ..Config::default()
        };
        let request = TranscribeRequest::new("sample.mp4", dir.path());

        let err = transcribe_video(&config, &request, false).await.unwrap_err();
        assert!(matches!(err, SubburnError::Config(_)), "{err:?}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
