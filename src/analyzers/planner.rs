use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::analyzers::join::JoinGroups;
use crate::config::Options;
use crate::AudioFile;

/// What to do with one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionDecision {
    None,
    Remove,
    /// Keep only the given channel; `None` lets the executor pick the valid one.
    Monoize { channel: Option<usize> },
    /// Only reachable by explicit request, never chosen by default.
    Split,
    Join {
        partners: Vec<PathBuf>,
        new_path: Option<PathBuf>,
    },
}

impl ActionDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionDecision::None => "None",
            ActionDecision::Remove => "Remove",
            ActionDecision::Monoize { .. } => "Monoize",
            ActionDecision::Split => "Split",
            ActionDecision::Join { .. } => "Join",
        }
    }
}

impl fmt::Display for ActionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct ActionPlanner<'a> {
    groups: &'a JoinGroups,
    options: &'a Options,
}

impl<'a> ActionPlanner<'a> {
    pub fn new(groups: &'a JoinGroups, options: &'a Options) -> Self {
        Self { groups, options }
    }

    /// Decide the action for `file`. Must only run once every file of the
    /// batch has been analysed and grouped.
    pub fn plan(&self, file: &AudioFile) -> ActionDecision {
        if self.options.join_enabled {
            if let Some(decision) = self.join_decision(file) {
                return decision;
            }
        }

        let verdict = &file.verdict;
        if verdict.is_empty && self.options.remove_enabled {
            ActionDecision::Remove
        } else if verdict.is_fake_stereo && self.options.monoize_enabled {
            ActionDecision::Monoize {
                channel: verdict.single_channel(),
            }
        } else {
            ActionDecision::None
        }
    }

    fn join_decision(&self, file: &AudioFile) -> Option<ActionDecision> {
        let group = self.groups.get(&file.location.filebase)?;
        match group.position(&file.path)? {
            0 => Some(ActionDecision::Join {
                partners: group.partners().iter().map(|m| m.path.clone()).collect(),
                new_path: Some(group.output_path()),
            }),
            // Consumed by the leader's join.
            _ => Some(ActionDecision::Remove),
        }
    }
}
