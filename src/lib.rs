pub mod audio;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod pipeline;
pub mod run_id;
pub mod subtitle;
pub mod transcribe;

pub use config::Config;
pub use error::{Result, Stage, SubburnError};
pub use pipeline::{
    print_summary, transcribe_video, Pipeline, PipelineResult, PipelineState, PipelineStats,
    TranscribeRequest,
};
pub use run_id::{ArtifactPaths, RunId};
