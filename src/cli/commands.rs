use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{db_to_amplitude, Options};

#[derive(Parser)]
#[command(name = "channel-tidy")]
#[command(version = "1.0")]
#[command(about = "Clean up multi-channel recordings: drop silence, collapse fake stereo, join split channels", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct AnalysisArgs {
    /// Separator between file name and channel label (voice.1.wav)
    #[arg(long, global = true, default_value = ".")]
    pub delimiter: String,

    /// Largest ratio difference, in dB, for channels to count as one signal
    #[arg(long, global = true, default_value_t = -100.0, allow_hyphen_values = true)]
    pub null_threshold_db: f32,

    /// Level, in dB, below which a sample counts as silence
    #[arg(long, global = true, default_value_t = -100.0, allow_hyphen_values = true)]
    pub empty_threshold_db: f32,

    /// Frames per analysis block (0 reads whole files)
    #[arg(long, global = true, default_value_t = 4096)]
    pub block_size: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a folder and show the planned actions
    Scan {
        /// Folder containing the audio files
        #[arg(short = 'i', long = "dir")]
        dir: PathBuf,

        /// Write the plan to this CSV file
        #[arg(short = 'o', long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        actions: ActionArgs,
    },

    /// Analyse a folder and carry out the planned actions
    Proceed {
        /// Folder containing the audio files
        #[arg(short = 'i', long = "dir")]
        dir: PathBuf,

        /// Only show what would happen
        #[arg(short = 'd', long)]
        dry_run: bool,

        #[command(flatten)]
        actions: ActionArgs,
    },

    /// Split a file into one mono file per channel
    Split {
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Keep the original file
        #[arg(short = 'k', long)]
        keep: bool,
    },

    /// Keep a single channel of a file
    Monoize {
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Channel to keep (0-based); defaults to the detected one
        #[arg(short = 'c', long)]
        channel: Option<usize>,
    },

    /// Join files channel by channel, in the given order
    Join {
        #[arg(short = 'f', long, num_args = 2.., required = true)]
        files: Vec<PathBuf>,

        /// Path of the joined file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Pad shorter files with silence
        #[arg(long)]
        forced: bool,

        /// Keep the source files
        #[arg(short = 'k', long)]
        keep: bool,
    },
}

#[derive(Args, Clone)]
pub struct ActionArgs {
    /// Never remove empty files
    #[arg(long)]
    pub no_remove: bool,

    /// Never monoize fake stereo files
    #[arg(long)]
    pub no_monoize: bool,

    /// Never join channel-split files
    #[arg(long)]
    pub no_join: bool,

    /// Join files of different lengths, padding with silence
    #[arg(long)]
    pub forced_join: bool,

    /// Keep join sources after writing the joined file
    #[arg(long)]
    pub keep_sources: bool,

    /// Order join members by channel number rather than label text
    #[arg(long)]
    pub numeric_order: bool,
}

impl AnalysisArgs {
    pub fn to_options(&self) -> Options {
        Options {
            null_threshold: db_to_amplitude(self.null_threshold_db),
            empty_threshold: db_to_amplitude(self.empty_threshold_db),
            delimiter: self.delimiter.clone(),
            block_size: self.block_size,
            ..Options::default()
        }
    }
}

impl ActionArgs {
    pub fn apply(&self, options: Options) -> Options {
        Options {
            remove_enabled: !self.no_remove,
            monoize_enabled: !self.no_monoize,
            join_enabled: !self.no_join,
            forced_join: self.forced_join,
            remove_sources: !self.keep_sources,
            numeric_join_order: self.numeric_order,
            ..options
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "channel-tidy",
            "--delimiter",
            "_",
            "proceed",
            "--dir",
            "takes",
            "--no-remove",
            "--forced-join",
        ]);
        let base = cli.analysis.to_options();
        assert_eq!(base.delimiter, "_");
        let Commands::Proceed { actions, dry_run, .. } = cli.command else {
            panic!("expected proceed");
        };
        assert!(!dry_run);
        let options = actions.apply(base);
        assert!(!options.remove_enabled);
        assert!(options.monoize_enabled);
        assert!(options.forced_join);
    }

    #[test]
    fn thresholds_are_given_in_decibels() {
        let cli = Cli::parse_from(["channel-tidy", "--empty-threshold-db", "-60", "scan", "--dir", "."]);
        let options = cli.analysis.to_options();
        assert!((options.empty_threshold - 0.001).abs() < 1e-7);
    }
}
