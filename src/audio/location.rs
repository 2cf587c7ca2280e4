use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

/// Path pieces of an audio file, including the channel label parsed
/// from a `<filebase><delimiter><label>` stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLocation {
    pub directory: PathBuf,
    pub base_name: String,
    pub stem: String,
    /// Extension with its leading dot, empty when there is none.
    pub extension: String,
    pub filebase: String,
    /// `"1"`, `"2"`, ... or empty; `L`/`R` are stored as `1`/`2`.
    pub channel_label: String,
}

/// Parses channel labels for one delimiter.
pub struct LocationParser {
    label_regex: Option<Regex>,
}

impl LocationParser {
    pub fn new(delimiter: &str) -> Self {
        let label_regex = if delimiter.is_empty() {
            None
        } else {
            let pattern = format!(r"(?s)^(?P<base>.*){}(?P<label>L|R|[0-9]+)$", regex::escape(delimiter));
            Regex::new(&pattern).ok()
        };
        Self { label_regex }
    }

    pub fn parse(&self, path: &Path) -> FileLocation {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let (filebase, channel_label) = self
            .label_regex
            .as_ref()
            .and_then(|re| re.captures(&stem))
            .map(|caps| {
                let label = match &caps["label"] {
                    "L" => "1".to_string(),
                    "R" => "2".to_string(),
                    other => other.to_string(),
                };
                (caps["base"].to_string(), label)
            })
            .unwrap_or_else(|| (stem.clone(), String::new()));

        FileLocation {
            directory,
            base_name,
            stem,
            extension,
            filebase,
            channel_label,
        }
    }
}

impl FileLocation {
    pub fn parse(path: &Path, delimiter: &str) -> Self {
        LocationParser::new(delimiter).parse(path)
    }

    /// Sibling path `<directory>/<name><extension>`.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}{}", name, self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_suffix_is_a_channel_label() {
        let loc = FileLocation::parse(Path::new("/takes/voice.3.wav"), ".");
        assert_eq!(loc.directory, PathBuf::from("/takes"));
        assert_eq!(loc.base_name, "voice.3.wav");
        assert_eq!(loc.stem, "voice.3");
        assert_eq!(loc.extension, ".wav");
        assert_eq!(loc.filebase, "voice");
        assert_eq!(loc.channel_label, "3");
    }

    #[test]
    fn left_and_right_normalise_to_numbers() {
        assert_eq!(FileLocation::parse(Path::new("drum.L.wav"), ".").channel_label, "1");
        assert_eq!(FileLocation::parse(Path::new("drum.R.wav"), ".").channel_label, "2");
    }

    #[test]
    fn unrecognised_suffix_keeps_whole_stem() {
        let loc = FileLocation::parse(Path::new("mix.final.wav"), ".");
        assert_eq!(loc.filebase, "mix.final");
        assert_eq!(loc.channel_label, "");

        let loc = FileLocation::parse(Path::new("sine.wav"), ".");
        assert_eq!(loc.filebase, "sine");
        assert_eq!(loc.channel_label, "");
    }

    #[test]
    fn custom_delimiter_only_splits_on_last_occurrence() {
        let loc = FileLocation::parse(Path::new("kick_in_2.wav"), "_");
        assert_eq!(loc.filebase, "kick_in");
        assert_eq!(loc.channel_label, "2");

        let loc = FileLocation::parse(Path::new("kick.2.wav"), "_");
        assert_eq!(loc.filebase, "kick.2");
        assert_eq!(loc.channel_label, "");
    }

    #[test]
    fn sibling_reuses_directory_and_extension() {
        let loc = FileLocation::parse(Path::new("/a/voice.1.wav"), ".");
        assert_eq!(loc.sibling("voice"), PathBuf::from("/a/voice.wav"));
    }
}
