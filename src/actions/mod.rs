//! Executors that apply a planned action to files on disk.
//!
//! Every executor writes its output before deleting anything, so a
//! failure part way through leaves the source files in place.

mod join;
mod monoize;
mod remove;
mod split;

use std::path::PathBuf;

use crate::analyzers::planner::ActionDecision;
use crate::audio::sink::{SampleSink, WavSink};
use crate::config::Options;
use crate::{AudioFile, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Skipped,
    Removed(PathBuf),
    /// The file was rewritten in place; this is its fresh analysis.
    Rewritten(AudioFile),
    Created(Vec<PathBuf>),
}

pub struct Transformer<S: SampleSink = WavSink> {
    sink: S,
    options: Options,
}

impl Transformer<WavSink> {
    pub fn new(options: Options) -> Self {
        Self::with_sink(WavSink::new(), options)
    }
}

impl<S: SampleSink> Transformer<S> {
    pub fn with_sink(sink: S, options: Options) -> Self {
        Self { sink, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run `decision` on `file`. Removal here is unconditional: the
    /// planner only picks it for files that should go.
    pub fn execute(&self, file: &AudioFile, decision: &ActionDecision) -> Result<ActionOutcome> {
        match decision {
            ActionDecision::None => Ok(ActionOutcome::Skipped),
            ActionDecision::Remove => self.remove(file, true),
            ActionDecision::Monoize { channel } => self.monoize(file, *channel),
            ActionDecision::Split => self.split(file, self.options.remove_sources),
            ActionDecision::Join { partners, new_path } => self.join(
                file,
                partners,
                new_path.as_deref(),
                self.options.forced_join,
                self.options.remove_sources,
            ),
        }
    }
}
