use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use subburn::config::Config;
use subburn::pipeline::{print_summary, transcribe_video, TranscribeRequest};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subburn")]
#[command(version, about = "Transcribe a video and burn the subtitles in")]
#[command(long_about = "Extract the audio of a video, transcribe it with the OpenAI transcription API and write a copy of the video with the subtitles rendered into the frames.")]
struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Hide progress spinners
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe a video and write a subtitled copy
    Transcribe(TranscribeArgs),
}

#[derive(clap::Args)]
struct TranscribeArgs {
    /// Path to the video file
    #[arg(short, long)]
    video: PathBuf,

    /// Directory receiving the audio, subtitle and video files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Language of the speech (e.g., en, ja, es)
    #[arg(short, long, default_value = "en")]
    language: String,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = Config::load_dotenv().context("Failed to load .env file")?;
    init_logging(cli.verbose);
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Transcribe(args) => {
            info!("Video:    {}", args.video.display());
            info!("Output:   {}", args.output.display());
            info!("Language: {}", args.language);

            let request = TranscribeRequest::new(args.video, args.output)
                .with_language(args.language);

            let result = transcribe_video(&config, &request, !cli.quiet)
                .await
                .context("Transcription run failed")?;

            print_summary(&result);
        }
    }

    Ok(())
}
