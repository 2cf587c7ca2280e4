use std::fs;

use log::info;

use super::{ActionOutcome, Transformer};
use crate::audio::sink::SampleSink;
use crate::{AudioFile, Result};

impl<S: SampleSink> Transformer<S> {
    /// Delete `file` if it is empty, or unconditionally when `forced`.
    pub fn remove(&self, file: &AudioFile, forced: bool) -> Result<ActionOutcome> {
        if !(forced || file.is_empty()) {
            return Ok(ActionOutcome::Skipped);
        }
        fs::remove_file(&file.path)?;
        info!("Removed {}", file.path.display());
        Ok(ActionOutcome::Removed(file.path.clone()))
    }
}
