use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use log::{info, warn};
use rayon::prelude::*;

use crate::analyzers::accumulator::AccumulatorState;
use crate::analyzers::classifier::classify;
use crate::audio::is_audio_extension;
use crate::audio::location::FileLocation;
use crate::audio::source::{SampleSource, WavSource};
use crate::config::Options;
use crate::utils::parallel::ParallelProcessor;
use crate::{AudioError, AudioFile, Result};

pub struct AudioAnalyzer;

impl ParallelProcessor for AudioAnalyzer {}

impl AudioAnalyzer {
    /// Decode `path` once, end to end, and classify its channels.
    pub fn analyze_path(path: impl AsRef<Path>, options: &Options) -> Result<AudioFile> {
        let path = path.as_ref();
        let mut source = WavSource::open(path)?;
        Self::analyze_source(path, &mut source, options)
    }

    /// Classify an already opened source that belongs to `path`.
    pub fn analyze_source<S: SampleSource + ?Sized>(path: &Path, source: &mut S, options: &Options) -> Result<AudioFile> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AudioError::UnsupportedFormat(format!("invalid file name: {}", path.display())))?
            .to_string();

        let mut frames = 0u64;
        let mut state = AccumulatorState::new(options.null_threshold, options.empty_threshold);
        while let Some(block) = source.next_block(options.block_size)? {
            frames += block.frame_count() as u64;
            state = state.update(&block)?;
        }
        let verdict = classify(&state)?;

        let audio_file = AudioFile {
            path: path.to_path_buf(),
            file_name,
            location: FileLocation::parse(path, &options.delimiter),
            channels: source.channel_count(),
            frames,
            sample_rate: source.sample_rate(),
            format: source.format(),
            verdict,
        };

        info!(
            "Analyzed {}: {} channels, {} frames, {} (mask {:#b})",
            audio_file.file_name,
            audio_file.channels,
            audio_file.frames,
            verdict.category(),
            verdict.valid_channel_mask
        );
        Ok(audio_file)
    }

    /// Audio files directly inside `dir`, sorted by path.
    pub fn collect_audio_files(dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Error accessing entry: {}", err);
                    None
                }
            })
            .filter(|e| {
                let has_valid_ext = e
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, is_audio_extension);
                // Writer leftovers from an interrupted run.
                let is_partial = e.file_name().to_string_lossy().starts_with('.');
                e.file_type().is_file() && has_valid_ext && !is_partial
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();
        paths
    }

    /// Analyse every file, one task per file. Files that fail are
    /// returned separately instead of aborting the batch.
    pub fn process_files(paths: &[PathBuf], options: &Options) -> (Vec<AudioFile>, Vec<(PathBuf, AudioError)>) {
        Self::init_parallel_processing();
        let progress = Self::get_progress_counter();
        let total_files = paths.len();

        let results: Vec<(PathBuf, Result<AudioFile>)> = paths
            .par_iter()
            .map(|path| {
                let result = Self::analyze_path(path, options);
                let processed = progress.fetch_add(1, Ordering::SeqCst) + 1;
                if processed % 100 == 0 || processed == total_files {
                    info!("Progress: {}/{} files", processed, total_files);
                }
                (path.clone(), result)
            })
            .collect();

        let mut files = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!("Excluding {}: {}", path.display(), e);
                    failures.push((path, e));
                }
            }
        }
        (files, failures)
    }
}
