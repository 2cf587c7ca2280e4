use std::fs;

use log::info;

use super::{ActionOutcome, Transformer};
use crate::audio::sink::SampleSink;
use crate::audio::source::{SampleSource, WavSource};
use crate::{AudioError, AudioFile, Result};

/// Labels for the split files: `L`/`R` for a stereo pair, `1..N` otherwise.
pub fn split_labels(channels: usize) -> Vec<String> {
    if channels == 2 {
        vec!["L".into(), "R".into()]
    } else {
        (1..=channels).map(|i| i.to_string()).collect()
    }
}

impl<S: SampleSink> Transformer<S> {
    /// Write one mono file per channel next to `file`, named
    /// `<stem><delimiter><label><extension>`.
    pub fn split(&self, file: &AudioFile, remove: bool) -> Result<ActionOutcome> {
        if file.channels < 2 {
            return Err(AudioError::InvalidAction(format!(
                "{} has a single channel, nothing to split",
                file.file_name
            )));
        }

        let data = {
            let mut source = WavSource::open(&file.path)?;
            source.read_all()?
        };

        let mut created = Vec::with_capacity(file.channels);
        for (i, label) in split_labels(file.channels).iter().enumerate() {
            let name = format!("{}{}{}", file.location.stem, self.options.delimiter, label);
            let target = file.location.sibling(&name);
            self.sink.write(&target, file.sample_rate, file.format, &data.channel(i))?;
            created.push(target);
        }
        info!("Split {} into {} files", file.path.display(), created.len());

        if remove {
            fs::remove_file(&file.path)?;
        }
        Ok(ActionOutcome::Created(created))
    }
}
