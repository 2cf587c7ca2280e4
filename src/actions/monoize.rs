use log::info;

use super::{ActionOutcome, Transformer};
use crate::audio::analysis::AudioAnalyzer;
use crate::audio::sink::SampleSink;
use crate::audio::source::{SampleSource, WavSource};
use crate::{AudioError, AudioFile, Result};

impl<S: SampleSink> Transformer<S> {
    /// Rewrite `file` in place keeping only one channel.
    ///
    /// Without an explicit `channel` the file must be fake stereo and its
    /// single valid channel is kept.
    pub fn monoize(&self, file: &AudioFile, channel: Option<usize>) -> Result<ActionOutcome> {
        let channel = match channel {
            Some(channel) => channel,
            None if file.is_fake_stereo() => file.verdict.single_channel().ok_or_else(|| {
                AudioError::InvalidAction(format!("{} has no single valid channel", file.file_name))
            })?,
            None => return Ok(ActionOutcome::Skipped),
        };
        if channel >= file.channels {
            return Err(AudioError::InvalidAction(format!(
                "channel {} out of range for {} ({} channels)",
                channel, file.file_name, file.channels
            )));
        }

        let data = {
            let mut source = WavSource::open(&file.path)?;
            source.read_all()?
        };
        let mono = data.channel(channel);
        self.sink.write(&file.path, file.sample_rate, file.format, &mono)?;
        info!("Monoized {} on channel {}", file.path.display(), channel);

        let reanalyzed = AudioAnalyzer::analyze_path(&file.path, &self.options)?;
        Ok(ActionOutcome::Rewritten(reanalyzed))
    }
}
