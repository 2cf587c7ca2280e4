use serde::{Deserialize, Serialize};

/// Convert a decibel value to a linear amplitude.
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Options shared by analysis, planning and the executors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Largest ratio difference for two channels to still count as one signal.
    #[serde(default = "default_threshold")]
    pub null_threshold: f32,
    /// Samples quieter than this are treated as silence.
    #[serde(default = "default_threshold")]
    pub empty_threshold: f32,
    /// Separator between the file base and its channel label.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_true")]
    pub remove_enabled: bool,
    #[serde(default = "default_true")]
    pub monoize_enabled: bool,
    #[serde(default = "default_true")]
    pub join_enabled: bool,
    /// Frames per analysis block, 0 reads the whole file as one block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Pad shorter join members with silence instead of refusing the join.
    #[serde(default)]
    pub forced_join: bool,
    /// Delete the inputs of a join or split once the output is written.
    #[serde(default = "default_true")]
    pub remove_sources: bool,
    /// Order join members by channel number instead of label text.
    #[serde(default)]
    pub numeric_join_order: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            null_threshold: default_threshold(),
            empty_threshold: default_threshold(),
            delimiter: default_delimiter(),
            remove_enabled: true,
            monoize_enabled: true,
            join_enabled: true,
            block_size: default_block_size(),
            forced_join: false,
            remove_sources: true,
            numeric_join_order: false,
        }
    }
}

fn default_threshold() -> f32 { db_to_amplitude(-100.0) }
fn default_delimiter() -> String { ".".into() }
fn default_true() -> bool { true }
fn default_block_size() -> usize { 4096 }
