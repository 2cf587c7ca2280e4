use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::debug;

use crate::AudioFile;

/// Files sharing one `filebase`, ordered by channel label.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinGroup {
    pub filebase: String,
    pub members: Vec<AudioFile>,
}

impl JoinGroup {
    pub fn leader(&self) -> &AudioFile {
        &self.members[0]
    }

    pub fn partners(&self) -> &[AudioFile] {
        &self.members[1..]
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.members.iter().position(|m| m.path == path)
    }

    /// Where the joined file goes: `<directory>/<filebase><extension>` of the leader.
    pub fn output_path(&self) -> PathBuf {
        self.leader().location.sibling(&self.filebase)
    }
}

pub type JoinGroups = BTreeMap<String, JoinGroup>;

/// Finds files that hold the separate channels of one recording.
#[derive(Debug, Default, Clone, Copy)]
pub struct JoinGroupResolver {
    numeric_order: bool,
}

impl JoinGroupResolver {
    pub fn new(numeric_order: bool) -> Self {
        Self { numeric_order }
    }

    pub fn resolve(&self, files: &[AudioFile]) -> JoinGroups {
        if files.len() <= 1 {
            return JoinGroups::new();
        }

        // First pass: every labelled file, once, in input order.
        let mut seen = HashSet::new();
        let labelled: Vec<&AudioFile> = files
            .iter()
            .filter(|f| !f.location.channel_label.is_empty())
            .filter(|f| seen.insert(f.path.clone()))
            .collect();

        // Second pass: bucket by filebase; the first file with a given label wins.
        let mut buckets: BTreeMap<&str, Vec<&AudioFile>> = BTreeMap::new();
        for file in labelled {
            let bucket = buckets.entry(file.location.filebase.as_str()).or_default();
            if bucket
                .iter()
                .any(|m| m.location.channel_label == file.location.channel_label)
            {
                debug!("Ignoring duplicate channel label: {}", file.path.display());
                continue;
            }
            bucket.push(file);
        }

        buckets
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(filebase, mut members)| {
                if self.numeric_order {
                    members.sort_by_key(|m| {
                        (
                            m.location.channel_label.parse::<u64>().unwrap_or(u64::MAX),
                            m.location.channel_label.clone(),
                        )
                    });
                } else {
                    members.sort_by(|a, b| a.location.channel_label.cmp(&b.location.channel_label));
                }
                let group = JoinGroup {
                    filebase: filebase.to_string(),
                    members: members.into_iter().cloned().collect(),
                };
                (filebase.to_string(), group)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analyzers::classifier::ChannelVerdict;
    use crate::audio::location::FileLocation;
    use crate::audio::source::SampleFormat;
    use pretty_assertions::assert_eq;

    pub(crate) fn described(path: &str, verdict: ChannelVerdict) -> AudioFile {
        let path = PathBuf::from(path);
        AudioFile {
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            location: FileLocation::parse(&path, "."),
            path,
            channels: verdict.channels,
            frames: 100,
            sample_rate: 44_100,
            format: SampleFormat::default(),
            verdict,
        }
    }

    fn mono(path: &str) -> AudioFile {
        described(path, ChannelVerdict::new(1, 1, true))
    }

    fn names(group: &JoinGroup) -> Vec<&str> {
        group.members.iter().map(|m| m.file_name.as_str()).collect()
    }

    #[test]
    fn numbered_takes_form_one_ordered_group() {
        let files = vec![mono("/s/voice.3.wav"), mono("/s/voice.1.wav"), mono("/s/voice.2.wav")];
        let groups = JoinGroupResolver::default().resolve(&files);
        assert_eq!(groups.len(), 1);
        let group = &groups["voice"];
        assert_eq!(names(group), vec!["voice.1.wav", "voice.2.wav", "voice.3.wav"]);
        assert_eq!(group.output_path(), PathBuf::from("/s/voice.wav"));
    }

    #[test]
    fn single_file_or_singleton_groups_are_dropped() {
        assert!(JoinGroupResolver::default().resolve(&[mono("/s/a.1.wav")]).is_empty());
        let files = vec![mono("/s/a.1.wav"), mono("/s/b.1.wav"), mono("/s/plain.wav")];
        assert!(JoinGroupResolver::default().resolve(&files).is_empty());
    }

    #[test]
    fn duplicate_labels_keep_first_seen() {
        let files = vec![
            mono("/s/drum.L.wav"),
            mono("/s/drum.1.wav"),
            mono("/s/drum.R.wav"),
            mono("/s/drum.L.wav"),
        ];
        let groups = JoinGroupResolver::default().resolve(&files);
        assert_eq!(names(&groups["drum"]), vec!["drum.L.wav", "drum.R.wav"]);
    }

    #[test]
    fn labels_sort_as_text_unless_numeric_order_is_requested() {
        let files: Vec<AudioFile> = ["2", "10", "1"]
            .iter()
            .map(|l| mono(&format!("/s/room.{}.wav", l)))
            .collect();

        let text = JoinGroupResolver::new(false).resolve(&files);
        assert_eq!(names(&text["room"]), vec!["room.1.wav", "room.10.wav", "room.2.wav"]);

        let numeric = JoinGroupResolver::new(true).resolve(&files);
        assert_eq!(names(&numeric["room"]), vec!["room.1.wav", "room.2.wav", "room.10.wav"]);
    }
}
