use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::{ActionOutcome, Transformer};
use crate::audio::sink::SampleSink;
use crate::audio::source::{SampleBlock, SampleSource, WavSource};
use crate::{AudioError, AudioFile, Result};

impl<S: SampleSink> Transformer<S> {
    /// Channel-concatenate `leader` and `partners`, in that order, into one file.
    ///
    /// Unequal lengths are refused unless `forced`, in which case shorter
    /// members are padded with silence to the longest one.
    pub fn join(
        &self,
        leader: &AudioFile,
        partners: &[PathBuf],
        new_path: Option<&Path>,
        forced: bool,
        remove: bool,
    ) -> Result<ActionOutcome> {
        if partners.is_empty() {
            return Err(AudioError::InvalidAction(format!("no files to join with {}", leader.file_name)));
        }
        if let Some(missing) = partners.iter().find(|p| !p.exists()) {
            return Err(AudioError::MissingJoinPartner(missing.clone()));
        }

        let output = self.join_output_path(leader, new_path);

        let mut members = Vec::with_capacity(partners.len() + 1);
        members.push((leader.path.clone(), read_all(&leader.path)?));
        for partner in partners {
            members.push((partner.clone(), read_all(partner)?));
        }

        let expected = members[0].1.frame_count();
        if !forced {
            if let Some((path, data)) = members.iter().find(|(_, data)| data.frame_count() != expected) {
                return Err(AudioError::FrameCountMismatch {
                    path: path.clone(),
                    expected: expected as u64,
                    found: data.frame_count() as u64,
                });
            }
        }
        let longest = members.iter().map(|(_, data)| data.frame_count()).max().unwrap_or(0);
        let (paths, blocks): (Vec<PathBuf>, Vec<SampleBlock>) = members
            .into_iter()
            .map(|(path, mut data)| {
                data.pad_to(longest);
                (path, data)
            })
            .unzip();

        let joined = SampleBlock::concat_channels(&blocks);
        self.sink.write(&output, leader.sample_rate, leader.format, &joined)?;
        info!(
            "Joined {} files into {} ({} channels)",
            paths.len(),
            output.display(),
            joined.channels
        );

        // The output is committed; a source that cannot be deleted is only logged.
        if remove {
            for path in paths.iter().filter(|p| **p != output) {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not remove joined source {}: {}", path.display(), e);
                }
            }
        }
        Ok(ActionOutcome::Created(vec![output]))
    }

    /// Explicit path, else the leader's stem without its channel suffix,
    /// else the leader itself.
    fn join_output_path(&self, leader: &AudioFile, new_path: Option<&Path>) -> PathBuf {
        if let Some(path) = new_path {
            return path.to_path_buf();
        }
        let location = &leader.location;
        if !location.channel_label.is_empty() && !self.options.delimiter.is_empty() {
            return location.sibling(&location.filebase);
        }
        leader.path.clone()
    }
}

fn read_all(path: &Path) -> Result<SampleBlock> {
    WavSource::open(path)?.read_all()
}
