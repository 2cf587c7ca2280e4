use std::path::PathBuf;
use serde::Serialize;

pub mod actions;
pub mod analyzers;
pub mod audio;
pub mod batch;
pub mod cli;
pub mod config;
pub mod utils;

use analyzers::classifier::ChannelVerdict;
use audio::location::FileLocation;
use audio::source::SampleFormat;

/// An analysed audio file: where it lives, its stream shape and the
/// channel verdict computed from its samples.
///
/// The verdict is only valid for the file content it was computed from;
/// any executor that rewrites the file returns a freshly analysed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFile {
    pub path: PathBuf,
    pub file_name: String,
    pub location: FileLocation,
    pub channels: usize,
    pub frames: u64,
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub verdict: ChannelVerdict,
}

impl AudioFile {
    pub fn is_empty(&self) -> bool {
        self.verdict.is_empty
    }

    pub fn is_fake_stereo(&self) -> bool {
        self.verdict.is_fake_stereo
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Cannot read audio from {path}: {reason}")]
    UnreadableSource { path: PathBuf, reason: String },
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Channel count changed mid-stream: expected {expected}, found {found}")]
    InconsistentChannelCount { expected: usize, found: usize },
    #[error("Correlated channels reported without a reference sample")]
    InsufficientSample,
    #[error("Join partner not found: {0}")]
    MissingJoinPartner(PathBuf),
    #[error("Frame count mismatch for {path}: expected {expected}, found {found}")]
    FrameCountMismatch { path: PathBuf, expected: u64, found: u64 },
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

// Re-exports for convenience
pub use actions::{ActionOutcome, Transformer};
pub use analyzers::accumulator::{AccumulatorState, Correlation};
pub use analyzers::classifier::{classify, ChannelCategory};
pub use analyzers::join::{JoinGroupResolver, JoinGroups};
pub use analyzers::planner::{ActionDecision, ActionPlanner};
pub use audio::analysis::AudioAnalyzer;
pub use batch::{Batch, BatchReport, PlannedAction};
pub use config::Options;
