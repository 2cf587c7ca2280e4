use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::actions::{ActionOutcome, Transformer};
use crate::analyzers::join::{JoinGroupResolver, JoinGroups};
use crate::analyzers::planner::{ActionDecision, ActionPlanner};
use crate::audio::analysis::AudioAnalyzer;
use crate::audio::sink::SampleSink;
use crate::config::Options;
use crate::{AudioError, AudioFile, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAction {
    pub file: AudioFile,
    pub decision: ActionDecision,
    /// Part of a join group led by another file; handled by that file's join.
    pub consumed_by_join: bool,
}

/// Outcome of running a plan. Nothing is rolled back on failure.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(PathBuf, ActionOutcome)>,
    pub failures: Vec<(PathBuf, AudioError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The audio files of one folder, analysed together.
pub struct Batch {
    folder: PathBuf,
    options: Options,
    files: Vec<AudioFile>,
    failures: Vec<(PathBuf, AudioError)>,
}

impl Batch {
    /// Analyse every audio file directly inside `folder`.
    pub fn scan(folder: impl AsRef<Path>, options: Options) -> Result<Self> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(AudioError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", folder.display()),
            )));
        }
        let paths = AudioAnalyzer::collect_audio_files(folder);
        info!("Found {} audio files in {}", paths.len(), folder.display());
        let (files, failures) = AudioAnalyzer::process_files(&paths, &options);
        Ok(Self {
            folder: folder.to_path_buf(),
            options,
            files,
            failures,
        })
    }

    pub fn from_files(files: Vec<AudioFile>, options: Options) -> Self {
        let folder = files
            .first()
            .map(|f| f.location.directory.clone())
            .unwrap_or_default();
        Self {
            folder,
            options,
            files,
            failures: Vec::new(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn files(&self) -> &[AudioFile] {
        &self.files
    }

    /// Files that could not be analysed and were left out.
    pub fn failures(&self) -> &[(PathBuf, AudioError)] {
        &self.failures
    }

    pub fn empty_files(&self) -> impl Iterator<Item = &AudioFile> {
        self.files.iter().filter(|f| f.verdict.is_empty)
    }

    pub fn fake_stereo_files(&self) -> impl Iterator<Item = &AudioFile> {
        self.files.iter().filter(|f| f.verdict.is_fake_stereo)
    }

    pub fn multichannel_files(&self) -> impl Iterator<Item = &AudioFile> {
        self.files.iter().filter(|f| f.verdict.is_multichannel)
    }

    /// Join groups of the batch. A group whose output would land on an
    /// existing file that is not one of its members is left out, so that
    /// file keeps its own action and no two tasks write the same path.
    pub fn join_groups(&self) -> JoinGroups {
        let mut groups = JoinGroupResolver::new(self.options.numeric_join_order).resolve(&self.files);
        groups.retain(|filebase, group| {
            let output = group.output_path();
            let collides = group.position(&output).is_none()
                && (output.exists() || self.files.iter().any(|f| f.path == output));
            if collides {
                warn!(
                    "Not joining {} files: {} already exists",
                    filebase,
                    output.display()
                );
            }
            !collides
        });
        groups
    }

    /// One decision per file, recomputed from scratch on every call.
    pub fn plan(&self) -> Vec<PlannedAction> {
        let groups = self.join_groups();
        let planner = ActionPlanner::new(&groups, &self.options);
        self.files
            .iter()
            .map(|file| {
                let decision = planner.plan(file);
                let consumed_by_join = self.options.join_enabled
                    && groups
                        .get(&file.location.filebase)
                        .and_then(|g| g.position(&file.path))
                        .map_or(false, |i| i > 0);
                PlannedAction {
                    file: file.clone(),
                    decision,
                    consumed_by_join,
                }
            })
            .collect()
    }

    /// Run `plan` with the default WAV writer.
    pub fn proceed(&mut self, plan: &[PlannedAction]) -> BatchReport {
        let transformer = Transformer::new(self.options.clone());
        self.proceed_with(&transformer, plan)
    }

    /// Joins run first, one task per group; every other file then runs
    /// as its own task. Join members never run on their own, so no path
    /// is touched by two tasks.
    pub fn proceed_with<S: SampleSink>(&mut self, transformer: &Transformer<S>, plan: &[PlannedAction]) -> BatchReport {
        let (joins, singles): (Vec<&PlannedAction>, Vec<&PlannedAction>) = plan
            .iter()
            .filter(|p| !p.consumed_by_join)
            .partition(|p| matches!(p.decision, ActionDecision::Join { .. }));

        let mut results: Vec<(PathBuf, Result<ActionOutcome>)> = joins
            .par_iter()
            .map(|p| (p.file.path.clone(), transformer.execute(&p.file, &p.decision)))
            .collect();
        results.extend(
            singles
                .par_iter()
                .filter(|p| p.decision != ActionDecision::None)
                .map(|p| (p.file.path.clone(), transformer.execute(&p.file, &p.decision)))
                .collect::<Vec<_>>(),
        );

        let mut report = BatchReport::default();
        for (path, result) in results {
            match result {
                Ok(outcome) => report.outcomes.push((path, outcome)),
                Err(e) => {
                    warn!("Action failed for {}: {}", path.display(), e);
                    report.failures.push((path, e));
                }
            }
        }
        self.refresh(&report);
        report
    }

    /// Drop files that are gone and take in the re-analysed ones.
    fn refresh(&mut self, report: &BatchReport) {
        let rewritten: Vec<&AudioFile> = report
            .outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                ActionOutcome::Rewritten(file) => Some(file),
                _ => None,
            })
            .collect();
        for file in &mut self.files {
            if let Some(fresh) = rewritten.iter().find(|f| f.path == file.path) {
                *file = (*fresh).clone();
            }
        }

        self.files.retain(|f| f.path.exists());

        let created = report.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            ActionOutcome::Created(paths) => Some(paths),
            _ => None,
        });
        for path in created.flatten() {
            match AudioAnalyzer::analyze_path(path, &self.options) {
                Ok(file) => {
                    self.files.retain(|f| f.path != file.path);
                    self.files.push(file);
                }
                Err(e) => warn!("Could not analyse new file {}: {}", path.display(), e),
            }
        }
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }
}
